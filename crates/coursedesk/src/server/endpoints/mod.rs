pub mod section_form;
pub mod status;
