//! The registry of third party codec instances.
//!
//! Codec instances are created on first use and reused afterwards.
//! Each instance sits behind its own lock,
//! held from the moment its input buffer is filled
//! until the decoded frame has been read out,
//! so that concurrent requests never share scratch buffers.

use crate::{CodecDecodeFailureSnafu, CodecTaskSnafu, Result};
use dicom_frame_codecs::adapters::{DecodeResult, DecodedFrame, ExternalCodec, FrameParameters};
use dicom_frame_codecs::ExternalCodecKind;
use snafu::ResultExt;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

type CodecSlot = Arc<Mutex<Option<Box<dyn ExternalCodec>>>>;

type CodecFactory = dyn Fn(ExternalCodecKind) -> DecodeResult<Box<dyn ExternalCodec>> + Send + Sync;

/// Lazily constructed codec instances, one per codec kind.
pub struct CodecRegistry {
    slots: HashMap<ExternalCodecKind, CodecSlot>,
    factory: Arc<CodecFactory>,
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("kinds", &self.slots.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecRegistry {
    /// Create a registry of the codecs compiled into this build.
    pub fn new() -> Self {
        Self::with_factory(ExternalCodecKind::create)
    }

    /// Create a registry which constructs its codec instances
    /// through the given function.
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn(ExternalCodecKind) -> DecodeResult<Box<dyn ExternalCodec>> + Send + Sync + 'static,
    {
        let slots = ExternalCodecKind::ALL
            .iter()
            .map(|kind| (*kind, Arc::new(Mutex::new(None))))
            .collect();
        CodecRegistry {
            slots,
            factory: Arc::new(factory),
        }
    }

    /// Decode a frame with the codec of the given kind,
    /// creating the codec instance if necessary.
    ///
    /// Waits for the codec to be free,
    /// then runs the decode on the blocking thread pool.
    pub async fn decode(
        &self,
        kind: ExternalCodecKind,
        encoded: Vec<u8>,
        params: FrameParameters,
    ) -> Result<DecodedFrame<'static>> {
        let mut slot = Arc::clone(&self.slots[&kind]).lock_owned().await;
        let factory = Arc::clone(&self.factory);

        let outcome = tokio::task::spawn_blocking(move || -> DecodeResult<DecodedFrame<'static>> {
            let mut codec = match slot.take() {
                Some(codec) => codec,
                None => {
                    debug!("Creating {} codec instance", kind.name());
                    factory(kind)?
                }
            };
            let outcome = codec
                .decode(&encoded, &params)
                .map_err(|e| e.resolve_message(codec.as_ref()));
            *slot = Some(codec);
            outcome
        })
        .await
        .context(CodecTaskSnafu)?;

        outcome.context(CodecDecodeFailureSnafu)
    }

    /// Whether an instance of the given codec kind currently exists.
    pub async fn is_initialized(&self, kind: ExternalCodecKind) -> bool {
        self.slots[&kind].lock().await.is_some()
    }

    /// Drop all codec instances,
    /// waiting for ongoing decodes to finish.
    ///
    /// The registry remains usable,
    /// instances are created again on demand.
    pub async fn shutdown(&self) {
        for kind in ExternalCodecKind::ALL {
            if self.slots[&kind].lock().await.take().is_some() {
                debug!("Released {} codec instance", kind.name());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use dicom_frame_codecs::adapters::{DecodeError, Endianness, FrameInfo};
    use std::borrow::Cow;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// A codec which echoes its input,
    /// failing if it is ever entered twice at once.
    struct EchoCodec {
        busy: AtomicBool,
    }

    impl ExternalCodec for EchoCodec {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn decode(
            &mut self,
            encoded: &[u8],
            params: &FrameParameters,
        ) -> DecodeResult<DecodedFrame<'static>> {
            assert!(!self.busy.swap(true, Ordering::SeqCst));
            std::thread::sleep(std::time::Duration::from_millis(2));
            if encoded.is_empty() {
                self.busy.store(false, Ordering::SeqCst);
                return Err(DecodeError::Codec {
                    codec: "echo",
                    code: Some(3),
                    message: None,
                });
            }
            let frame = DecodedFrame {
                data: Cow::Owned(encoded.to_vec()),
                info: FrameInfo::from_parameters(params),
                byte_order: Endianness::Little,
                truncated: false,
            };
            self.busy.store(false, Ordering::SeqCst);
            Ok(frame)
        }

        fn describe_error(&self, code: i32) -> Option<String> {
            (code == 3).then(|| "premature end of stream".to_string())
        }
    }

    fn counting_registry() -> (CodecRegistry, Arc<AtomicUsize>) {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&created);
        let registry = CodecRegistry::with_factory(move |_kind| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(EchoCodec {
                busy: AtomicBool::new(false),
            }) as Box<dyn ExternalCodec>)
        });
        (registry, created)
    }

    fn params() -> FrameParameters {
        FrameParameters {
            rows: 1,
            columns: 4,
            samples_per_pixel: 1,
            bits_allocated: 8,
            bits_stored: 8,
            signed: false,
            planar_configuration: 0,
            decode_level: None,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_decodes_share_one_instance() {
        let (registry, created) = counting_registry();
        let registry = Arc::new(registry);
        assert!(!registry.is_initialized(ExternalCodecKind::Jpeg).await);

        let tasks: Vec<_> = (0..8_u8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    registry
                        .decode(ExternalCodecKind::Jpeg, vec![i; 4], params())
                        .await
                })
            })
            .collect();
        for (i, task) in tasks.into_iter().enumerate() {
            let frame = task.await.unwrap().unwrap();
            assert_eq!(frame.data.as_ref(), &[i as u8; 4]);
        }

        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert!(registry.is_initialized(ExternalCodecKind::Jpeg).await);
        assert!(!registry.is_initialized(ExternalCodecKind::JpegLs).await);

        registry.shutdown().await;
        assert!(!registry.is_initialized(ExternalCodecKind::Jpeg).await);
        registry
            .decode(ExternalCodecKind::Jpeg, vec![1; 4], params())
            .await
            .unwrap();
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn error_codes_are_described_by_the_codec() {
        let (registry, _) = counting_registry();
        let err = registry
            .decode(ExternalCodecKind::Jpeg2000, Vec::new(), params())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CodecDecodeFailure);
        assert!(snafu::Report::from_error(&err)
            .to_string()
            .contains("premature end of stream"));
        // the instance survives a failed decode
        assert!(registry.is_initialized(ExternalCodecKind::Jpeg2000).await);
    }

    #[tokio::test]
    async fn factory_failures_are_decode_failures() {
        let registry = CodecRegistry::with_factory(|kind| {
            Err(DecodeError::CodecUnavailable {
                codec: kind.name(),
                feature: kind.feature(),
            })
        });
        let err = registry
            .decode(ExternalCodecKind::JpegLs, vec![0], params())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CodecDecodeFailure);
        assert!(!registry.is_initialized(ExternalCodecKind::JpegLs).await);
    }
}
