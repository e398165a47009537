pub mod camera_service;
pub mod completion;
pub mod serial_queue;
