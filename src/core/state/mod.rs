// Export progress tracking

pub mod cursor;

pub use cursor::ExportCursor;
