use crate::runner::classifier::ListField;
use serde::Serialize;
use std::collections::BTreeMap;

/// One item of a `7z l -slt` listing.
///
/// `fields` holds every recognised field exactly as the tool printed it,
/// keyed by field name. The other members are a parsed view of the same
/// values: trimmed, empty values as `None`, and `size` only when it is a
/// number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveEntry {
    pub path: String,
    pub size: Option<u64>,
    pub crc: Option<String>,
    pub attributes: Option<String>,
    pub method: Option<String>,
    pub fields: BTreeMap<String, String>,
}

impl ArchiveEntry {
    /// Unparsed value of `field`, if the tool printed it for this entry.
    pub fn raw(&self, field: ListField) -> Option<&str> {
        self.fields.get(field.name()).map(String::as_str)
    }

    pub fn is_directory(&self) -> bool {
        self.attributes
            .as_deref()
            .is_some_and(|attributes| attributes.starts_with('D'))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveListing {
    /// `Some(true)` for solid archives; `None` when the tool did not say.
    pub solid: Option<bool>,
    pub entries: Vec<ArchiveEntry>,
}

impl ArchiveListing {
    pub fn files(&self) -> impl Iterator<Item = &ArchiveEntry> {
        self.entries.iter().filter(|entry| !entry.is_directory())
    }
}

/// Groups list fields into entries: every `Path` field opens a new record.
///
/// 7z starts the listing with a record describing the archive itself. That
/// record is recognised by its path (the first record naming the listed
/// archive) or by carrying a `Solid` field, and is not reported as an entry.
#[derive(Debug, Default)]
pub struct ListingCollector {
    archive_path: Option<String>,
    listing: ArchiveListing,
    current: Option<ArchiveEntry>,
    current_is_header: bool,
    records: usize,
}

impl ListingCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_archive<S: Into<String>>(archive_path: S) -> Self {
        Self {
            archive_path: Some(archive_path.into()),
            ..Self::default()
        }
    }

    pub fn push(&mut self, field: ListField, value: &str) {
        if field == ListField::Path {
            self.flush();
        }
        if let Some(entry) = self.current.as_mut() {
            entry
                .fields
                .insert(field.name().to_string(), value.to_string());
        }

        match field {
            ListField::Path => {
                self.current_is_header =
                    self.records == 0 && self.archive_path.as_deref() == Some(value);
                self.records += 1;
                self.current = Some(ArchiveEntry {
                    path: value.to_string(),
                    fields: BTreeMap::from([(field.name().to_string(), value.to_string())]),
                    ..ArchiveEntry::default()
                });
            }
            ListField::Solid => {
                self.listing.solid = Some(value.trim() == "+");
                self.current_is_header = true;
            }
            ListField::Size => {
                if let Some(entry) = self.current.as_mut() {
                    entry.size = value.trim().parse().ok();
                }
            }
            ListField::Crc => self.set(value, |entry, v| entry.crc = v),
            ListField::Attributes => self.set(value, |entry, v| entry.attributes = v),
            ListField::Method => self.set(value, |entry, v| entry.method = v),
        }
    }

    pub fn finish(mut self) -> ArchiveListing {
        self.flush();
        self.listing
    }

    fn set(&mut self, value: &str, apply: impl FnOnce(&mut ArchiveEntry, Option<String>)) {
        if let Some(entry) = self.current.as_mut() {
            let value = value.trim();
            apply(entry, (!value.is_empty()).then(|| value.to_string()));
        }
    }

    fn flush(&mut self) {
        if let Some(entry) = self.current.take() {
            if !self.current_is_header {
                self.listing.entries.push(entry);
            }
        }
        self.current_is_header = false;
    }
}
