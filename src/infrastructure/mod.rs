pub mod collaborators;
pub mod in_memory;
pub mod json_file;
