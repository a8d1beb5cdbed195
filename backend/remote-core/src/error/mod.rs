pub mod config;
pub mod connection;
pub mod frame;
pub mod image;
pub mod router;

pub use config::ConfigError;
pub use connection::ConnectionError;
pub use frame::FrameError;
pub use image::ImageDecodeError;
pub use router::RouterError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Connection(#[from] connection::ConnectionError),

    #[error(transparent)]
    Frame(#[from] frame::FrameError),

    #[error(transparent)]
    Image(#[from] image::ImageDecodeError),

    #[error(transparent)]
    Router(#[from] router::RouterError),
}
