use thiserror::Error;

use crate::model::{MaterialError, ParseIdError, UserError};
use crate::sequence::SequenceError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Material(#[from] MaterialError),
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Id(#[from] ParseIdError),
    #[error(transparent)]
    Sequence(#[from] SequenceError),
}
