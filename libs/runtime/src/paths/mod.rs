pub mod home_dir;

pub use home_dir::{resolve_home_dir, HomeDirError};
