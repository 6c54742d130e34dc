//! XML utilities for the OSM handler.

mod utils;

pub use utils::{
    collect_tags, escape, find_children, get_tag_name, is_xml_text, parse_attribute,
    required_attribute,
};
