pub mod store;

pub use store::{PlayerSettings, load_settings, save_settings};
