pub mod dialogue;
pub mod layout;
pub mod locale;
pub mod markup;
pub mod measure;
pub mod style;
pub mod ui;
