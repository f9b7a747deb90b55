pub mod page_helpers;
pub mod sanitization_helpers;
pub mod site_helpers;
pub mod text_helpers;
