pub mod import_all;
pub mod import_group;
pub mod list_groups;
