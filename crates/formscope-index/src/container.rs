//! Service registrations from a compiled container dump.
//!
//! Form extensions and form type aliases can be registered as tagged
//! services instead of (or on top of) being discoverable from the class
//! hierarchy. The XML dump the framework writes on cache warmup lists them
//! as `<service>` elements with `<tag>` children.

use crate::error::{Error, Result};
use indexmap::{IndexMap, IndexSet};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;

/// Tag marking a form type extension service.
pub const FORM_TYPE_EXTENSION_TAG: &str = "form.type_extension";
/// Tag marking a form type service.
pub const FORM_TYPE_TAG: &str = "form.type";

/// Service registration lookup consumed by the form analyses.
pub trait ServiceRegistry {
    /// Extension class FQN → the types it is registered against. A class
    /// registered without naming a type maps to an empty set.
    fn form_extensions(&self) -> IndexMap<String, IndexSet<String>>;

    /// Form type alias → class FQN.
    fn form_type_aliases(&self) -> IndexMap<String, String>;
}

/// In-memory registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticServices {
    pub extensions: IndexMap<String, IndexSet<String>>,
    pub type_aliases: IndexMap<String, String>,
}

impl StaticServices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extension(mut self, class: &str, extended_type: Option<&str>) -> Self {
        let types = self.extensions.entry(strip_leading_backslash(class)).or_default();
        types.extend(extended_type.map(strip_leading_backslash));
        self
    }

    pub fn with_type_alias(mut self, alias: &str, class: &str) -> Self {
        self.type_aliases
            .insert(alias.to_string(), strip_leading_backslash(class));
        self
    }
}

impl ServiceRegistry for StaticServices {
    fn form_extensions(&self) -> IndexMap<String, IndexSet<String>> {
        self.extensions.clone()
    }

    fn form_type_aliases(&self) -> IndexMap<String, String> {
        self.type_aliases.clone()
    }
}

/// A `<tag>` of a service definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceTag {
    pub name: String,
    pub attributes: IndexMap<String, String>,
}

impl ServiceTag {
    fn attribute(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .find_map(|key| self.attributes.get(*key))
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }
}

/// A `<service>` definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceDefinition {
    pub id: Option<String>,
    pub class: Option<String>,
    pub tags: Vec<ServiceTag>,
}

impl ServiceDefinition {
    /// Class of the service. Services registered under their class name
    /// omit the `class` attribute.
    pub fn class_name(&self) -> Option<String> {
        self.class
            .as_deref()
            .or_else(|| self.id.as_deref().filter(|id| id.contains('\\')))
            .map(strip_leading_backslash)
    }

    pub fn tags_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ServiceTag> {
        self.tags.iter().filter(move |t| t.name == name)
    }
}

/// Services parsed from a container XML dump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerServices {
    pub services: Vec<ServiceDefinition>,
}

impl ContainerServices {
    /// Read and parse a container dump file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let xml = std::fs::read_to_string(path)?;
        Self::from_xml(&xml)
    }

    /// Parse a container dump.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_reader(xml.as_bytes());
        reader.config_mut().trim_text(true);

        let mut services = Vec::new();
        // Inline service definitions nest inside arguments
        let mut open: Vec<ServiceDefinition> = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => match e.name().as_ref() {
                    b"service" => open.push(service_from(e)?),
                    b"tag" => {
                        if let Some(service) = open.last_mut() {
                            service.tags.push(tag_from(e)?);
                        }
                    }
                    _ => {}
                },
                Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                    b"service" => services.push(service_from(e)?),
                    b"tag" => {
                        if let Some(service) = open.last_mut() {
                            service.tags.push(tag_from(e)?);
                        }
                    }
                    _ => {}
                },
                Ok(Event::End(ref e)) => {
                    if e.name().as_ref() == b"service" {
                        if let Some(service) = open.pop() {
                            services.push(service);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::xml(format!(
                        "XML parse error at position {}: {e}",
                        reader.error_position()
                    )));
                }
                _ => {}
            }
            buf.clear();
        }

        tracing::debug!("read {} service definitions", services.len());
        Ok(ContainerServices { services })
    }
}

impl ServiceRegistry for ContainerServices {
    fn form_extensions(&self) -> IndexMap<String, IndexSet<String>> {
        let mut extensions: IndexMap<String, IndexSet<String>> = IndexMap::new();
        for service in &self.services {
            let Some(class) = service.class_name() else {
                continue;
            };
            for tag in service.tags_named(FORM_TYPE_EXTENSION_TAG) {
                let extended = tag
                    .attribute(&["extended-type", "extended_type", "alias"])
                    .map(strip_leading_backslash);
                extensions.entry(class.clone()).or_default().extend(extended);
            }
        }
        extensions
    }

    fn form_type_aliases(&self) -> IndexMap<String, String> {
        let mut aliases = IndexMap::new();
        for service in &self.services {
            let Some(class) = service.class_name() else {
                continue;
            };
            for tag in service.tags_named(FORM_TYPE_TAG) {
                if let Some(alias) = tag.attribute(&["alias"]) {
                    aliases.insert(alias.to_string(), class.clone());
                }
            }
        }
        aliases
    }
}

fn attributes(e: &BytesStart<'_>) -> Result<IndexMap<String, String>> {
    let mut out = IndexMap::new();
    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|e| Error::xml(format!("Attribute error: {e}")))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| Error::xml(format!("Attribute key error: {e}")))?;
        let value = attr
            .unescape_value()
            .map_err(|e| Error::xml(format!("Attribute value error: {e}")))?
            .to_string();
        out.insert(key.to_string(), value);
    }
    Ok(out)
}

fn service_from(e: &BytesStart<'_>) -> Result<ServiceDefinition> {
    let mut attrs = attributes(e)?;
    Ok(ServiceDefinition {
        id: attrs.shift_remove("id"),
        class: attrs.shift_remove("class"),
        tags: Vec::new(),
    })
}

fn tag_from(e: &BytesStart<'_>) -> Result<ServiceTag> {
    let mut attributes = attributes(e)?;
    let name = attributes.shift_remove("name").unwrap_or_default();
    Ok(ServiceTag { name, attributes })
}

fn strip_leading_backslash(name: &str) -> String {
    name.trim_start_matches('\\').to_string()
}
