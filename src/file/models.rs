//! Data models for file share operations

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Entry of a share directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FileListItem {
    File { name: String, size: u64 },
    Directory { name: String },
}

impl FileListItem {
    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. } | Self::Directory { name } => name,
        }
    }
}

/// Body of a `List Directories and Files` response
#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct EnumerationResults {
    #[serde(default)]
    pub entries: Entries,
    #[serde(default)]
    pub next_marker: String,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct Entries {
    #[serde(default)]
    pub file: Vec<FileEntry>,
    #[serde(default)]
    pub directory: Vec<DirectoryEntry>,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct FileEntry {
    pub name: String,
    #[serde(default)]
    pub properties: FileProperties,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
pub(crate) struct FileProperties {
    #[serde(rename = "Content-Length")]
    pub content_length: Option<u64>,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct DirectoryEntry {
    pub name: String,
}

impl EnumerationResults {
    /// Directories first, then files; both in service order.
    pub fn into_items(self) -> Vec<FileListItem> {
        self.entries
            .directory
            .into_iter()
            .map(|d| FileListItem::Directory { name: d.name })
            .chain(self.entries.file.into_iter().map(|f| FileListItem::File {
                name: f.name,
                size: f.properties.content_length.unwrap_or_default(),
            }))
            .collect()
    }
}

/// Parse one `List Directories and Files` page into its items and the
/// marker of the next page (empty on the last page).
pub(crate) fn parse_listing_page(body: &str) -> Result<(Vec<FileListItem>, String)> {
    let mut page: EnumerationResults = quick_xml::de::from_str(body)?;
    let marker = std::mem::take(&mut page.next_marker);
    Ok((page.into_items(), marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listing() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults ServiceEndpoint="https://acct.file.core.windows.net/" ShareName="docs" DirectoryPath="">
  <Marker />
  <Entries>
    <File>
      <FileId>13835128424026341376</FileId>
      <Name>notes.txt</Name>
      <Properties>
        <Content-Length>42</Content-Length>
      </Properties>
    </File>
    <Directory>
      <FileId>13835128424026341377</FileId>
      <Name>reports</Name>
      <Properties />
    </Directory>
  </Entries>
  <NextMarker>page-2</NextMarker>
</EnumerationResults>"#;

        let results: EnumerationResults = quick_xml::de::from_str(xml).unwrap();
        assert_eq!(results.next_marker, "page-2");
        assert_eq!(
            results.into_items(),
            vec![
                FileListItem::Directory {
                    name: "reports".to_string()
                },
                FileListItem::File {
                    name: "notes.txt".to_string(),
                    size: 42
                },
            ]
        );
    }

    #[test]
    fn test_parse_empty_listing() {
        let xml = r#"<EnumerationResults ShareName="docs" DirectoryPath=""><Entries /><NextMarker /></EnumerationResults>"#;
        let results: EnumerationResults = quick_xml::de::from_str(xml).unwrap();
        assert!(results.next_marker.is_empty());
        assert!(results.into_items().is_empty());
    }

    #[test]
    fn test_parse_interleaved_entries() {
        // the service returns entries in name order, mixing both kinds
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults ShareName="docs" DirectoryPath="projects">
  <Entries>
    <File><Name>a.txt</Name><Properties><Content-Length>3</Content-Length></Properties></File>
    <Directory><Name>b</Name><Properties /></Directory>
    <File><Name>c.txt</Name><Properties><Content-Length>5</Content-Length></Properties></File>
    <Directory><Name>d</Name><Properties /></Directory>
  </Entries>
  <NextMarker />
</EnumerationResults>"#;

        let (items, marker) = parse_listing_page(xml).unwrap();
        assert!(marker.is_empty());
        let names: Vec<&str> = items.iter().map(FileListItem::name).collect();
        assert_eq!(names, vec!["b", "d", "a.txt", "c.txt"]);
        assert_eq!(
            items[3],
            FileListItem::File {
                name: "c.txt".to_string(),
                size: 5
            }
        );
    }

    #[test]
    fn test_parse_listing_page_returns_marker() {
        let xml = r#"<EnumerationResults ShareName="docs" DirectoryPath=""><Entries><File><Name>x</Name><Properties><Content-Length>1</Content-Length></Properties></File></Entries><NextMarker>2!8!MDAwMDA1IXguY3N2</NextMarker></EnumerationResults>"#;
        let (items, marker) = parse_listing_page(xml).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(marker, "2!8!MDAwMDA1IXguY3N2");
    }
}
