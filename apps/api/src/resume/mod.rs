// Resume documents: the model's text flattening, form-editor operations,
// lifecycle, storage, live subscriptions and print preview.

pub mod editor;
pub mod handlers;
pub mod lifecycle;
pub mod live;
pub mod preview;
pub mod store;
pub mod text;
