pub mod drive;
mod ids;
mod material;
mod progress;
mod session;
mod user;

pub use drive::DriveVideo;
pub use ids::{MaterialId, ParseIdError, UserId};
pub use material::{GENERAL_TOPIC, Material, MaterialError, MaterialKind};
pub use progress::{Percent, ProgressMap, ProgressState};
pub use session::{PAID_SESSION_DAYS, Session, TRIAL_DAYS, Viewer};
pub use user::{AccountStatus, Role, User, UserError};
