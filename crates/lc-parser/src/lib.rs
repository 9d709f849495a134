mod sanitize;
mod xml;

pub use sanitize::prepare_problem_source;
pub use xml::{parse_xml_document, XmlDocument, XmlElementNode, XmlNode, XmlTextNode};
