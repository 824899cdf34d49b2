//! `META-INF/container.xml` model and validation.
//!
//! The container file only points at one or more package documents. Parsing
//! follows OCF: structural problems that still leave a usable rootfile are
//! warnings or errors, while a container without any usable rootfile is fatal.

extern crate alloc;

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use quick_xml::escape::escape;

use crate::diagnostics::LogCollection;
use crate::xml::{parse_document, XmlElement};

/// Archive path of the container file.
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// XML namespace of container documents.
pub const CONTAINER_NAMESPACE: &str = "urn:oasis:names:tc:opendocument:xmlns:container";

/// The only container version defined by OCF.
pub const CONTAINER_VERSION: &str = "1.0";

/// Media type of an OPF package document.
pub const OPF_MEDIA_TYPE: &str = "application/oebps-package+xml";

/// Conventional package document path.
pub const DEFAULT_ROOTFILE_PATH: &str = "OEBPS/content.opf";

const XML_FULL_PATH: &str = "full-path";
const XML_MEDIA_TYPE: &str = "media-type";

/// A `<rootfile>` reference to one package document.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RootFileInformation {
    full_path: String,
    media_type: String,
}

impl Default for RootFileInformation {
    /// `OEBPS/content.opf` with the OPF media type.
    fn default() -> Self {
        Self::new(DEFAULT_ROOTFILE_PATH, OPF_MEDIA_TYPE)
    }
}

impl RootFileInformation {
    /// Create a rootfile reference.
    pub fn new(full_path: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            full_path: full_path.into(),
            media_type: media_type.into(),
        }
    }

    /// Path of the package document, relative to the archive root.
    ///
    /// Empty when the source element had no `full-path`.
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    /// Declared media type; empty when the source element had none.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }
}

/// Parsed container file.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContainerFile {
    version: String,
    roots: Vec<RootFileInformation>,
}

impl ContainerFile {
    /// Create a version 1.0 container listing `roots`.
    pub fn new(roots: Vec<RootFileInformation>) -> Self {
        Self::with_version(CONTAINER_VERSION, roots)
    }

    /// Create a container with an explicit version attribute.
    pub fn with_version(version: impl Into<String>, roots: Vec<RootFileInformation>) -> Self {
        Self {
            version: version.into(),
            roots,
        }
    }

    /// Value of the `version` attribute; empty when absent.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Rootfile entries in document order.
    pub fn roots(&self) -> &[RootFileInformation] {
        &self.roots
    }

    /// First rootfile with a non-empty `full-path`.
    pub fn primary_root(&self) -> Option<&RootFileInformation> {
        self.roots.iter().find(|root| !root.full_path.is_empty())
    }

    /// Serialize back to a container document.
    pub fn to_xml(&self) -> String {
        let version = if self.version.is_empty() {
            CONTAINER_VERSION
        } else {
            self.version.as_str()
        };

        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str(&format!(
            "<container version=\"{}\" xmlns=\"{}\">\n",
            escape(version),
            CONTAINER_NAMESPACE
        ));
        xml.push_str("  <rootfiles>\n");
        for root in &self.roots {
            xml.push_str(&format!(
                "    <rootfile {}=\"{}\" {}=\"{}\"/>\n",
                XML_FULL_PATH,
                escape(root.full_path.as_str()),
                XML_MEDIA_TYPE,
                escape(root.media_type.as_str())
            ));
        }
        xml.push_str("  </rootfiles>\n");
        xml.push_str("</container>\n");
        xml
    }
}

/// Parse and validate container document bytes.
///
/// Returns `None` after recording a fatal diagnostic when the document has no
/// usable rootfile; every other deviation is recorded and parsing continues.
pub fn parse_container_xml(content: &[u8], logs: &mut LogCollection) -> Option<ContainerFile> {
    let root = match parse_document(content) {
        Ok(Some(root)) => root,
        Ok(None) => {
            logs.fatal("container.xml document does not have a root element.");
            return None;
        }
        Err(err) => {
            logs.fatal(format!("container.xml should be a valid XML document ({}).", err));
            return None;
        }
    };

    if !root.is(CONTAINER_NAMESPACE, "container") {
        logs.warning(format!(
            "container.xml root element should be <container> in namespace '{}', found <{}>.",
            CONTAINER_NAMESPACE,
            root.local_name()
        ));
    }
    check_container_version(&root, logs);

    let rootfiles: Vec<&XmlElement> = root
        .child(CONTAINER_NAMESPACE, "rootfiles")
        .map(|collection| {
            collection
                .children_named(CONTAINER_NAMESPACE, "rootfile")
                .collect()
        })
        .unwrap_or_default();
    if rootfiles.is_empty() {
        logs.fatal("container.xml should contain at least one rootfile (package document).");
        return None;
    }

    let roots: Vec<RootFileInformation> = rootfiles
        .into_iter()
        .map(|element| parse_rootfile(element, logs))
        .collect();
    if roots.iter().all(|root| root.full_path.is_empty()) {
        logs.fatal("container.xml rootfile should contain full-path attribute with value.");
        return None;
    }

    let version = root.attribute("version").unwrap_or_default();
    Some(ContainerFile::with_version(version, roots))
}

fn check_container_version(container: &XmlElement, logs: &mut LogCollection) {
    match container.attribute("version") {
        None => logs.warning("Container element must have a version attribute."),
        Some("") => logs.warning("Container element version attribute must have value."),
        Some(CONTAINER_VERSION) => {}
        Some(other) => logs.warning(format!(
            "Container element version attribute must be '{}', found '{}'.",
            CONTAINER_VERSION, other
        )),
    }
}

fn parse_rootfile(element: &XmlElement, logs: &mut LogCollection) -> RootFileInformation {
    let media_type = element.attribute(XML_MEDIA_TYPE).unwrap_or_default();
    if media_type.is_empty() {
        logs.warning("container.xml rootfile should contain media-type attribute.");
    }
    if media_type != OPF_MEDIA_TYPE {
        logs.warning(format!(
            "Expected media-type attribute value to be '{}' but found '{}' instead.",
            OPF_MEDIA_TYPE, media_type
        ));
    }

    let full_path = element.attribute(XML_FULL_PATH).unwrap_or_default();
    if full_path.is_empty() {
        logs.error("container.xml rootfile should contain full-path attribute.");
    }

    RootFileInformation::new(full_path, media_type)
}
