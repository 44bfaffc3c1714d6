mod game_form;

pub use game_form::{EditForm, FilePart, PlaybackSettings, UploadForm};
