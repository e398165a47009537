pub mod authorizer;
pub mod capture_backend;
pub mod photo_delegate;
pub mod session_observer;
