//! OPF package document root attributes.
//!
//! Only the `<package>` element itself is read: its version, unique identifier
//! reference, id, base direction and language.

extern crate alloc;

use alloc::format;
use alloc::string::String;

use quick_xml::escape::escape;

use crate::diagnostics::LogCollection;
use crate::xml::parse_document;

/// XML namespace of OPF package documents.
pub const OPF_NAMESPACE: &str = "http://www.idpf.org/2007/opf";

/// Major EPUB revision declared by a package document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EpubVersion {
    /// 2.x versions
    V2,
    /// 3.x versions
    V3,
}

/// Base direction (bidi) of textual content and attribute values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum BaseTextDirection {
    /// Determined using the Unicode Bidi Algorithm.
    #[default]
    Auto,
    /// Left-to-right.
    Ltr,
    /// Right-to-left.
    Rtl,
}

impl BaseTextDirection {
    /// Parse an XML `dir` attribute value.
    pub fn from_attribute(value: &str) -> Option<Self> {
        match value {
            "auto" => Some(Self::Auto),
            "ltr" => Some(Self::Ltr),
            "rtl" => Some(Self::Rtl),
            _ => None,
        }
    }

    /// XML attribute value for this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Ltr => "ltr",
            Self::Rtl => "rtl",
        }
    }
}

/// Attributes of the package document's `<package>` element.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PackageDocument {
    /// Value of `version`.
    pub version: Option<String>,
    /// Value of `unique-identifier`.
    pub unique_identifier: Option<String>,
    /// Value of `id`.
    pub id: Option<String>,
    /// Value of `dir`, when it named a known direction.
    pub dir: Option<BaseTextDirection>,
    /// Value of `xml:lang`.
    pub lang: Option<String>,
}

impl PackageDocument {
    /// Effective base direction; [`BaseTextDirection::Auto`] when unspecified.
    pub fn dir(&self) -> BaseTextDirection {
        self.dir.unwrap_or_default()
    }

    /// EPUB revision derived from [`version`](Self::version).
    pub fn epub_version(&self) -> Option<EpubVersion> {
        let version = self.version.as_deref()?;
        let major = version.split('.').next()?.trim();
        match major {
            "2" => Some(EpubVersion::V2),
            "3" => Some(EpubVersion::V3),
            _ => None,
        }
    }

    /// Serialize as an (empty) `<package>` element.
    ///
    /// Attributes that were not set are omitted.
    pub fn to_xml(&self) -> String {
        let mut xml = format!("<package xmlns=\"{}\"", OPF_NAMESPACE);
        let attributes = [
            ("version", self.version.as_deref()),
            ("unique-identifier", self.unique_identifier.as_deref()),
            ("id", self.id.as_deref()),
            ("dir", self.dir.map(BaseTextDirection::as_str)),
            ("xml:lang", self.lang.as_deref()),
        ];
        for (name, value) in attributes {
            if let Some(value) = value {
                xml.push_str(&format!(" {}=\"{}\"", name, escape(value)));
            }
        }
        xml.push_str(" />");
        xml
    }
}

/// Parse package document bytes.
///
/// Returns `None` after recording a fatal diagnostic when the document is not
/// a well-formed OPF `<package>`.
pub fn parse_package_document(
    content: &[u8],
    path: &str,
    logs: &mut LogCollection,
) -> Option<PackageDocument> {
    let root = match parse_document(content) {
        Ok(Some(root)) => root,
        Ok(None) => {
            logs.fatal(format!("Package document '{}' does not have a root element.", path));
            return None;
        }
        Err(err) => {
            logs.fatal(format!(
                "Package document '{}' should be a valid XML document ({}).",
                path, err
            ));
            return None;
        }
    };
    if !root.is(OPF_NAMESPACE, "package") {
        logs.fatal(format!(
            "Package document '{}' root element should be <package> in namespace '{}', found <{}>.",
            path,
            OPF_NAMESPACE,
            root.local_name()
        ));
        return None;
    }

    let mut document = PackageDocument {
        version: root.attribute("version").map(String::from),
        unique_identifier: root.attribute("unique-identifier").map(String::from),
        id: root.attribute("id").map(String::from),
        dir: None,
        lang: root.attribute("xml:lang").map(String::from),
    };

    match document.version.as_deref() {
        None | Some("") => logs.error("Package element must have a version attribute."),
        Some(version) if document.epub_version().is_none() => logs.warning(format!(
            "Package element version '{}' is neither an EPUB 2 nor an EPUB 3 version.",
            version
        )),
        Some(_) => {}
    }
    if document.unique_identifier.as_deref().unwrap_or_default().is_empty() {
        logs.error("Package element must have a unique-identifier attribute.");
    }
    if let Some(dir) = root.attribute("dir") {
        document.dir = BaseTextDirection::from_attribute(dir);
        if document.dir.is_none() {
            logs.warning(format!(
                "Package element dir attribute must be 'auto', 'ltr' or 'rtl', found '{}'.",
                dir
            ));
        }
    }

    Some(document)
}
