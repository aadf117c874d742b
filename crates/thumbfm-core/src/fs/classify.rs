//! Item type classification.
//!
//! A file's coarse type comes from the top-level category of its MIME type,
//! then [`TYPE_OVERRIDES`] refines it. MIME categories alone are too coarse to
//! be useful in a browser listing (`.json` would show up as `application`).

use std::fmt;

use serde::Serialize;

/// The semantic type of a catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Folder,
    File,
    Image,
    Video,
    Audio,
    Text,
    Executable,
    Package,
    Application,
}

impl ItemType {
    /// Returns the icon tag shown for this type.
    pub fn icon(self) -> &'static str {
        match self {
            ItemType::Folder => "icon-folder",
            ItemType::Audio => "icon-audio",
            ItemType::Video => "icon-movie",
            ItemType::Image => "icon-image",
            ItemType::Text => "icon-edit",
            ItemType::Executable => "icon-puzzle",
            ItemType::Package => "icon-file-zip",
            ItemType::Application => "icon-file-code",
            ItemType::File => "icon-file",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Folder => "folder",
            ItemType::File => "file",
            ItemType::Image => "image",
            ItemType::Video => "video",
            ItemType::Audio => "audio",
            ItemType::Text => "text",
            ItemType::Executable => "executable",
            ItemType::Package => "package",
            ItemType::Application => "application",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extension overrides, applied in order after the MIME lookup. A later row
/// wins over an earlier one.
pub const TYPE_OVERRIDES: &[(ItemType, &[&str])] = &[
    (ItemType::Application, &["jsx", "vue"]),
    (
        ItemType::Text,
        &["json", "xml", "ini", "info", "nfo", "cnf", "config", "lst", "list"],
    ),
    (
        ItemType::Executable,
        &[
            "exe", "apk", "app", "ipa", "sh", "ksh", "py", "cpl", "msi", "msp", "msc", "mst",
            "cmd", "bat", "reg", "rgs", "run", "out", "job", "paf", "pif", "vb", "vbe", "vbs",
            "ws", "wsf", "wsh",
        ],
    ),
    (
        ItemType::Package,
        &[
            "a", "ar", "lbr", "iso", "dmg", "mar", "rar", "sda", "jar", "pak", "zip", "zipx",
            "7z", "s7z", "zz", "gz", "lz", "rz", "sz", "xz", "shar", "bz2", "ace", "arc", "cab",
            "car",
        ],
    ),
];

/// Names treated as system files: dotfiles, `$`-prefixed entries and common
/// OS metadata files. Matched case-insensitively as prefixes.
const PROTECTED_PREFIXES: &[&str] = &[".", "$", "desktop.ini", "thumbs.db"];

/// Classifies an entry by name.
///
/// Directories are always [`ItemType::Folder`] with no extension. A file
/// without a recognizable dotted extension is [`ItemType::File`].
pub fn classify(name: &str, is_dir: bool) -> (ItemType, String) {
    if is_dir {
        return (ItemType::Folder, String::new());
    }
    let Some(extension) = extension_of(name) else {
        return (ItemType::File, String::new());
    };

    let mut item_type = mime_category(&extension);
    for (override_type, extensions) in TYPE_OVERRIDES {
        if extensions.contains(&extension.as_str()) {
            item_type = *override_type;
        }
    }
    (item_type, extension)
}

/// Returns the lowercased suffix after the last `.`, provided it consists of
/// word characters or `-` only.
pub fn extension_of(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    let valid = !ext.is_empty()
        && ext
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    valid.then(|| ext.to_ascii_lowercase())
}

/// Returns `true` if the name looks like a reserved or system file.
///
/// Advisory only; nothing in the core refuses to operate on protected items.
pub fn is_protected(name: &str) -> bool {
    let lower = name.to_lowercase();
    PROTECTED_PREFIXES.iter().any(|prefix| lower.starts_with(prefix))
}

fn mime_category(extension: &str) -> ItemType {
    let Some(mime) = mime_guess::from_ext(extension).first() else {
        return ItemType::File;
    };
    match mime.type_().as_str() {
        "audio" => ItemType::Audio,
        "video" => ItemType::Video,
        "image" => ItemType::Image,
        "text" => ItemType::Text,
        "application" => ItemType::Application,
        _ => ItemType::File,
    }
}
