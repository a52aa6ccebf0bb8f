//! Streaming decoder for Subsonic XML responses.
//!
//! Responses are walked element by element straight off the response
//! body. Subtrees the decoder has no use for are skipped without being
//! materialized, so memory stays proportional to nesting depth rather than
//! response size.
//!
//! ```text
//! <subsonic-response status="ok">
//!   <indexes>
//!     <index name="A"><artist id="1" name="ABBA"/></index>
//!     <child id="9" title="Loose track" isVideo="false"/>
//!   </indexes>
//! </subsonic-response>
//! ```

use crate::error::{Result, SubsonicError};
use crate::types::{CatalogEntry, NodeKind};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;
use tokio::io::AsyncBufRead;

/// Top-level outcome reported by the `subsonic-response` envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseStatus {
    Ok,
    Failed {
        /// Numeric `code` of the nested `error` element, if present
        code: Option<i32>,
        message: Option<String>,
    },
}

impl ResponseStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, ResponseStatus::Ok)
    }

    fn into_error(self) -> SubsonicError {
        match self {
            ResponseStatus::Ok => SubsonicError::malformed("response reported success"),
            ResponseStatus::Failed { code, message } => SubsonicError::Api {
                code: code.unwrap_or(0),
                message: message.unwrap_or_default(),
            },
        }
    }
}

/// An element start tag, detached from the reader's buffer.
#[derive(Debug)]
struct Element {
    qname: Vec<u8>,
    name: String,
    attributes: Vec<(String, String)>,
    /// Self-closing (`<artist ... />`), so there is nothing to skip
    empty: bool,
}

impl Element {
    fn from_start(start: &BytesStart<'_>, empty: bool) -> Result<Self> {
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            qname: start.name().as_ref().to_vec(),
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            attributes,
            empty,
        })
    }

    fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn flag(&self, key: &str) -> bool {
        self.attr(key) == Some("true")
    }

    fn required(&self, key: &str) -> Result<&str> {
        self.attr(key).ok_or_else(|| {
            SubsonicError::malformed(format!("<{}> is missing the '{}' attribute", self.name, key))
        })
    }
}

/// Pull-style cursor over the element structure of a response.
struct XmlCursor<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    /// Number of currently open elements
    depth: usize,
}

impl<R: AsyncBufRead + Unpin> XmlCursor<R> {
    fn new(source: R) -> Self {
        Self {
            reader: Reader::from_reader(source),
            buf: Vec::new(),
            depth: 0,
        }
    }

    /// Advance to the next child start tag of the current element.
    ///
    /// Returns `None` once the current element's end tag is consumed.
    /// Text, comments and processing instructions are ignored.
    async fn next_child(&mut self) -> Result<Option<Element>> {
        loop {
            self.buf.clear();
            match self.reader.read_event_into_async(&mut self.buf).await? {
                Event::Start(start) => {
                    let element = Element::from_start(&start, false)?;
                    self.depth += 1;
                    return Ok(Some(element));
                }
                Event::Empty(start) => return Ok(Some(Element::from_start(&start, true)?)),
                Event::End(_) => {
                    self.depth = self.depth.saturating_sub(1);
                    return Ok(None);
                }
                Event::Eof if self.depth > 0 => {
                    return Err(SubsonicError::malformed("response ended inside an element"));
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }

    /// Consume everything up to and including `element`'s end tag.
    async fn skip(&mut self, element: &Element) -> Result<()> {
        if element.empty {
            return Ok(());
        }
        self.buf.clear();
        self.reader
            .read_to_end_into_async(QName(&element.qname), &mut self.buf)
            .await?;
        self.depth = self.depth.saturating_sub(1);
        Ok(())
    }

    /// Read the `subsonic-response` envelope and its status.
    ///
    /// On failure the nested `error` element is read as well.
    async fn open_envelope(&mut self) -> Result<ResponseStatus> {
        let root = self
            .next_child()
            .await?
            .ok_or_else(|| SubsonicError::malformed("empty response"))?;

        if root.name != "subsonic-response" {
            return Err(SubsonicError::malformed(format!(
                "expected <subsonic-response>, found <{}>",
                root.name
            )));
        }

        if root.attr("status") == Some("ok") {
            return Ok(ResponseStatus::Ok);
        }

        if root.empty {
            return Ok(ResponseStatus::Failed {
                code: None,
                message: None,
            });
        }

        let (code, message) = match self.next_child().await? {
            Some(error) if error.name == "error" => (
                error.attr("code").and_then(|c| c.trim().parse().ok()),
                error.attr("message").map(str::to_string),
            ),
            _ => (None, None),
        };

        Ok(ResponseStatus::Failed { code, message })
    }

    /// Open the envelope, requiring `status="ok"`, then step into the
    /// payload element called `payload`.
    async fn open_payload(&mut self, payload: &str) -> Result<Element> {
        let status = self.open_envelope().await?;
        if !status.is_ok() {
            return Err(status.into_error());
        }

        loop {
            let element = self.next_child().await?.ok_or_else(|| {
                SubsonicError::malformed(format!("response has no <{}> element", payload))
            })?;
            if element.name == payload {
                return Ok(element);
            }
            self.skip(&element).await?;
        }
    }
}

/// Read just the status of a response, as needed for `ping`.
pub async fn read_response_status<R>(source: R) -> Result<ResponseStatus>
where
    R: AsyncBufRead + Unpin,
{
    XmlCursor::new(source).open_envelope().await
}

/// Only an explicit `isVideo="true"` marks a video; a missing attribute
/// counts as audio.
fn is_video(element: &Element) -> bool {
    element.flag("isVideo")
}

fn track_entry(element: &Element) -> Result<CatalogEntry> {
    Ok(CatalogEntry::new(
        element.required("id")?,
        element.attr("title").unwrap_or_default(),
        NodeKind::Track,
    ))
}

/// Decodes a `getIndexes` response into top-level entries.
///
/// Yields every `artist` of every `index` group, and every non-video bare
/// `child` directly under `indexes`, in document order.
pub struct IndexDecoder<R> {
    cursor: XmlCursor<R>,
    in_group: bool,
    done: bool,
}

impl<R: AsyncBufRead + Unpin> IndexDecoder<R> {
    /// Read the envelope and step into `indexes`.
    ///
    /// Fails with [`SubsonicError::Api`] if the server reported an error.
    pub async fn open(source: R) -> Result<Self> {
        let mut cursor = XmlCursor::new(source);
        let indexes = cursor.open_payload("indexes").await?;

        Ok(Self {
            cursor,
            in_group: false,
            done: indexes.empty,
        })
    }

    pub async fn next_entry(&mut self) -> Result<Option<CatalogEntry>> {
        while !self.done {
            let Some(element) = self.cursor.next_child().await? else {
                if self.in_group {
                    self.in_group = false;
                } else {
                    self.done = true;
                }
                continue;
            };

            if self.in_group {
                if element.name == "artist" {
                    let entry = CatalogEntry::new(
                        element.required("id")?,
                        element.attr("name").unwrap_or_default(),
                        NodeKind::Artist,
                    );
                    self.cursor.skip(&element).await?;
                    return Ok(Some(entry));
                }
                self.cursor.skip(&element).await?;
                continue;
            }

            match element.name.as_str() {
                "index" => self.in_group = !element.empty,
                "child" if !is_video(&element) => {
                    let entry = track_entry(&element)?;
                    self.cursor.skip(&element).await?;
                    return Ok(Some(entry));
                }
                _ => self.cursor.skip(&element).await?,
            }
        }

        Ok(None)
    }
}

/// Decodes a `getMusicDirectory` response.
///
/// Yields an album for each `child` with `isDir="true"` and a track for each
/// other non-video `child`, in document order.
pub struct DirectoryDecoder<R> {
    cursor: XmlCursor<R>,
    directory_id: String,
    done: bool,
}

impl<R: AsyncBufRead + Unpin> DirectoryDecoder<R> {
    /// Read the envelope and step into `directory`.
    pub async fn open(source: R) -> Result<Self> {
        let mut cursor = XmlCursor::new(source);
        let directory = cursor.open_payload("directory").await?;
        let directory_id = directory.required("id")?.to_string();

        Ok(Self {
            cursor,
            directory_id,
            done: directory.empty,
        })
    }

    /// Id of the directory being listed.
    pub fn directory_id(&self) -> &str {
        &self.directory_id
    }

    pub async fn next_entry(&mut self) -> Result<Option<CatalogEntry>> {
        while !self.done {
            let Some(element) = self.cursor.next_child().await? else {
                self.done = true;
                break;
            };

            let entry = match element.name.as_str() {
                "child" if element.flag("isDir") => Some(CatalogEntry::new(
                    element.required("id")?,
                    element.attr("title").unwrap_or_default(),
                    NodeKind::Album,
                )),
                "child" if !is_video(&element) => Some(track_entry(&element)?),
                _ => None,
            };

            self.cursor.skip(&element).await?;
            if entry.is_some() {
                return Ok(entry);
            }
        }

        Ok(None)
    }
}
