//! Corrections and their in-order executor
//!
//! A [`Correction`] pairs a human-readable message with an optional write
//! command. Commands are immutable value objects built at plan time that own
//! every field they need to execute, so a correction never borrows planner
//! or loop state. A correction without a command is a report-only entry for
//! diff previews.

use crate::errors::{DnsError, Result};
use async_trait::async_trait;
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// A fully specified provider write, executable without further context
#[async_trait]
pub trait CorrectionCommand: fmt::Debug + Send + Sync {
    async fn run(&self) -> Result<()>;
}

/// One planned operation needed to converge a zone
#[derive(Debug)]
pub struct Correction {
    /// Audit/log line describing the operation
    pub message: String,
    /// The write to perform; `None` for report-only entries
    pub command: Option<Box<dyn CorrectionCommand>>,
}

impl Correction {
    pub fn new(message: impl Into<String>, command: impl CorrectionCommand + 'static) -> Self {
        Correction {
            message: message.into(),
            command: Some(Box::new(command)),
        }
    }

    /// Message-only entry used purely for diff previews
    pub fn report(message: impl Into<String>) -> Self {
        Correction {
            message: message.into(),
            command: None,
        }
    }

    pub fn is_report(&self) -> bool {
        self.command.is_none()
    }
}

/// Applies corrections in list order, stopping at the first failure.
///
/// No retry, no rollback: partial application is a legal end state that the
/// caller re-converges on the next run. Later corrections may depend on
/// earlier deletes, so order is binding. Returns the number of corrections
/// applied; a failure carries the index of the failing correction, so
/// everything before it is known to have been applied and everything from it
/// on was not. The cancellation token is checked before each correction.
pub async fn apply_corrections(
    corrections: &[Correction],
    cancel: &CancellationToken,
) -> Result<usize> {
    for (index, correction) in corrections.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(DnsError::CorrectionFailed {
                index,
                message: correction.message.clone(),
                source: Box::new(DnsError::Cancelled),
            });
        }
        info!(message = %correction.message, "applying correction");
        if let Some(command) = &correction.command {
            command
                .run()
                .await
                .map_err(|source| DnsError::CorrectionFailed {
                    index,
                    message: correction.message.clone(),
                    source: Box::new(source),
                })?;
        }
    }
    Ok(corrections.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug)]
    struct FakeWrite {
        id: u32,
        applied: Arc<Mutex<Vec<u32>>>,
        fail: bool,
    }

    #[async_trait]
    impl CorrectionCommand for FakeWrite {
        async fn run(&self) -> Result<()> {
            if self.fail {
                return Err(DnsError::Api("write rejected".to_string()));
            }
            self.applied.lock().unwrap().push(self.id);
            Ok(())
        }
    }

    fn write(id: u32, applied: &Arc<Mutex<Vec<u32>>>, fail: bool) -> Correction {
        Correction::new(
            format!("write {}", id),
            FakeWrite {
                id,
                applied: Arc::clone(applied),
                fail,
            },
        )
    }

    #[tokio::test]
    async fn test_applies_in_list_order() {
        let applied = Arc::new(Mutex::new(Vec::new()));
        let corrections = vec![
            write(1, &applied, false),
            Correction::report("just a note"),
            write(2, &applied, false),
        ];
        let count = apply_corrections(&corrections, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(count, 3);
        assert_eq!(*applied.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_stops_at_first_failure() {
        let applied = Arc::new(Mutex::new(Vec::new()));
        let corrections = vec![
            write(1, &applied, false),
            write(2, &applied, true),
            write(3, &applied, false),
        ];
        let err = apply_corrections(&corrections, &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            DnsError::CorrectionFailed { index, message, .. } => {
                assert_eq!(index, 1);
                assert_eq!(message, "write 2");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(*applied.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_cancellation_stops_before_next_write() {
        let applied = Arc::new(Mutex::new(Vec::new()));
        let corrections = vec![write(1, &applied, false)];
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = apply_corrections(&corrections, &cancel).await.unwrap_err();
        match err {
            DnsError::CorrectionFailed { index, source, .. } => {
                assert_eq!(index, 0);
                assert!(matches!(*source, DnsError::Cancelled));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(applied.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_report_entries_have_no_command() {
        let report = Correction::report("preview only");
        assert!(report.is_report());
        let count = apply_corrections(&[report], &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
