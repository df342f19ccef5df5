//! Newline-delimited JSON block source.
//!
//! Each non-blank line holds one [`RawBlock`] document. Lines are read and
//! decoded lazily, one block per poll, so memory stays flat regardless of
//! file size.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tracing::{debug, instrument, trace};

use strata_core::error::{ChainError, ChainResult};
use strata_core::ports::{BlockSource, BlockStream, RawBlock};

/// Reads block extracts from a JSON Lines file.
#[derive(Debug, Clone)]
pub struct JsonLinesSource {
    path: PathBuf,
}

impl JsonLinesSource {
    /// Open a source over `path`.
    ///
    /// Fails with [`ChainError::ConnectionFailed`] if the file cannot be
    /// accessed. The file is reopened by each call to [`BlockSource::blocks`].
    pub async fn open(path: impl AsRef<Path>) -> ChainResult<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| ChainError::ConnectionFailed(format!("{}: {}", path.display(), e)))?;

        if !metadata.is_file() {
            return Err(ChainError::ConnectionFailed(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        debug!(path = %path.display(), bytes = metadata.len(), "Opened block extract file");
        Ok(Self { path })
    }
}

struct LineCursor {
    lines: Lines<BufReader<File>>,
    /// 1-based number of the last line read.
    line_no: usize,
}

impl LineCursor {
    /// Next block at or above `from_height`, skipping blank lines.
    async fn next_block(&mut self, from_height: u64) -> ChainResult<Option<RawBlock>> {
        while let Some(line) = self
            .lines
            .next_line()
            .await
            .map_err(|e| ChainError::ReadError(e.to_string()))?
        {
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }

            let block: RawBlock =
                serde_json::from_str(&line).map_err(|e| ChainError::DecodeError {
                    line: self.line_no,
                    message: e.to_string(),
                })?;

            if block.height() < from_height {
                trace!(height = block.height(), "Skipping block below start height");
                continue;
            }
            return Ok(Some(block));
        }
        Ok(None)
    }
}

#[async_trait]
impl BlockSource for JsonLinesSource {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn blocks(&self, from_height: u64) -> ChainResult<BlockStream> {
        let file = File::open(&self.path)
            .await
            .map_err(|e| ChainError::ConnectionFailed(format!("{}: {}", self.path.display(), e)))?;

        let cursor = LineCursor {
            lines: BufReader::new(file).lines(),
            line_no: 0,
        };

        // An error ends the stream after it is yielded.
        let stream = futures::stream::try_unfold(cursor, move |mut cursor| async move {
            let block = cursor.next_block(from_height).await?;
            Ok::<_, ChainError>(block.map(|b| (b, cursor)))
        });

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn header_line(height: u64) -> String {
        format!(
            r#"{{"header":{{"id":"{height:010}-aaaaa","height":{height},"hash":"0x01","parentHash":"0x02","stateRoot":"0x03","extrinsicsRoot":"0x04","specName":"node","specVersion":1,"implName":"node","implVersion":1}}}}"#
        )
    }

    fn write_file(lines: &[String]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    async fn collect(source: &JsonLinesSource, from: u64) -> Vec<ChainResult<RawBlock>> {
        source.blocks(from).await.unwrap().collect().await
    }

    #[tokio::test]
    async fn yields_blocks_in_file_order_and_skips_blank_lines() {
        let file = write_file(&[header_line(1), String::new(), "   ".into(), header_line(2)]);
        let source = JsonLinesSource::open(file.path()).await.unwrap();

        let heights: Vec<u64> = collect(&source, 0)
            .await
            .into_iter()
            .map(|r| r.unwrap().height())
            .collect();
        assert_eq!(heights, vec![1, 2]);
    }

    #[tokio::test]
    async fn skips_blocks_below_start_height() {
        let file = write_file(&[header_line(5), header_line(6), header_line(7)]);
        let source = JsonLinesSource::open(file.path()).await.unwrap();

        let heights: Vec<u64> = collect(&source, 6)
            .await
            .into_iter()
            .map(|r| r.unwrap().height())
            .collect();
        assert_eq!(heights, vec![6, 7]);
    }

    #[tokio::test]
    async fn malformed_line_reports_line_number_and_ends_stream() {
        let file = write_file(&[
            header_line(1),
            String::new(),
            "{not json".into(),
            header_line(3),
        ]);
        let source = JsonLinesSource::open(file.path()).await.unwrap();

        let results = collect(&source, 0).await;
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        match &results[1] {
            Err(ChainError::DecodeError { line, .. }) => assert_eq!(*line, 3),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn each_call_replays_from_the_start() {
        let file = write_file(&[header_line(1), header_line(2)]);
        let source = JsonLinesSource::open(file.path()).await.unwrap();

        assert_eq!(collect(&source, 0).await.len(), 2);
        assert_eq!(collect(&source, 0).await.len(), 2);
    }

    #[tokio::test]
    async fn open_rejects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonLinesSource::open(dir.path().join("absent.jsonl"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::ConnectionFailed(_)));

        let err = JsonLinesSource::open(dir.path()).await.unwrap_err();
        assert!(matches!(err, ChainError::ConnectionFailed(_)));
    }
}
