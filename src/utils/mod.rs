pub mod file_io;
pub mod net;
pub mod time;
