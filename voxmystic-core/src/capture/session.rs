use std::future::Future;

use async_trait::async_trait;
use tokio::sync::watch;

use super::{CaptureError, CapturedAudio};
use crate::audio::{encode_wav, AudioProfile, AudioSample};

/// A live stream of interleaved f32 audio, such as an open microphone.
///
/// Device streams are usually tied to the thread that opened them, so the
/// returned futures are not `Send`.
#[async_trait(?Send)]
pub trait SampleSource {
    fn profile(&self) -> AudioProfile;

    /// Next chunk of samples, or `None` once the source has ended
    async fn next_chunk(&mut self) -> Option<Vec<f32>>;

    /// Release the underlying device. Safe to call more than once.
    fn stop(&mut self);
}

/// Input loudness of the most recent chunk
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LevelFrame {
    pub rms: f32,
    pub peak: f32,
}

impl LevelFrame {
    pub fn measure(chunk: &[f32]) -> Self {
        if chunk.is_empty() {
            return Self::default();
        }
        let mut sum = 0.0f64;
        let mut peak = 0.0f32;
        for &s in chunk {
            let s = if s.is_finite() { s.abs().min(1.0) } else { 0.0 };
            sum += f64::from(s) * f64::from(s);
            peak = peak.max(s);
        }
        Self {
            rms: (sum / chunk.len() as f64).sqrt() as f32,
            peak,
        }
    }
}

/// Accumulates audio from a [`SampleSource`] until told to stop.
///
/// The source is stopped on every exit path: normal completion, errors,
/// and the session being dropped mid-recording.
pub struct RecordingSession<S: SampleSource> {
    source: S,
    captured: Vec<f32>,
    stopped: bool,
    levels: watch::Sender<LevelFrame>,
}

impl<S: SampleSource> RecordingSession<S> {
    pub fn new(source: S) -> Self {
        let (levels, _) = watch::channel(LevelFrame::default());
        Self {
            source,
            captured: Vec::new(),
            stopped: false,
            levels,
        }
    }

    /// Subscribe to per-chunk input levels for visualization
    pub fn levels(&self) -> watch::Receiver<LevelFrame> {
        self.levels.subscribe()
    }

    /// Record until `stop` resolves or the source ends, then package the
    /// audio as a WAV sample.
    pub async fn record_until<F>(mut self, stop: F) -> Result<CapturedAudio, CaptureError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(stop);
        tracing::info!(profile = ?self.source.profile(), "recording started");

        loop {
            tokio::select! {
                biased;
                _ = &mut stop => break,
                chunk = self.source.next_chunk() => match chunk {
                    Some(chunk) => self.push(chunk),
                    None => break,
                },
            }
        }

        self.finish()
    }

    fn push(&mut self, chunk: Vec<f32>) {
        self.levels.send_replace(LevelFrame::measure(&chunk));
        self.captured.extend(chunk);
    }

    fn stop_source(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.source.stop();
            tracing::debug!("recording source stopped");
        }
    }

    fn finish(mut self) -> Result<CapturedAudio, CaptureError> {
        self.stop_source();
        let samples = std::mem::take(&mut self.captured);
        if samples.is_empty() {
            return Err(CaptureError::NothingRecorded);
        }

        let profile = self.source.profile();
        let sample = AudioSample::new(samples, profile.sample_rate, profile.channels)?;
        let duration = sample.duration();
        let wav = encode_wav(sample)?;

        tracing::info!(?duration, bytes = wav.len(), "recording finished");
        Ok(CapturedAudio::from_wav(wav))
    }
}

impl<S: SampleSource> Drop for RecordingSession<S> {
    fn drop(&mut self) {
        self.stop_source();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use crate::audio::WavHeader;

    struct ScriptedSource {
        chunks: VecDeque<Vec<f32>>,
        channels: u16,
        stops: Arc<AtomicUsize>,
        hang_when_drained: bool,
    }

    impl ScriptedSource {
        fn new(chunks: Vec<Vec<f32>>, hang_when_drained: bool) -> (Self, Arc<AtomicUsize>) {
            let stops = Arc::new(AtomicUsize::new(0));
            let source = Self {
                chunks: chunks.into(),
                channels: 1,
                stops: stops.clone(),
                hang_when_drained,
            };
            (source, stops)
        }
    }

    #[async_trait(?Send)]
    impl SampleSource for ScriptedSource {
        fn profile(&self) -> AudioProfile {
            AudioProfile {
                sample_rate: 16_000,
                channels: self.channels,
            }
        }

        async fn next_chunk(&mut self) -> Option<Vec<f32>> {
            match self.chunks.pop_front() {
                Some(chunk) => Some(chunk),
                None if self.hang_when_drained => std::future::pending().await,
                None => None,
            }
        }

        fn stop(&mut self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn records_until_source_ends() {
        let (source, stops) = ScriptedSource::new(vec![vec![0.1; 160], vec![-0.2; 160]], false);
        let session = RecordingSession::new(source);

        let captured = session
            .record_until(std::future::pending())
            .await
            .unwrap();

        assert_eq!(captured.mime_type, "audio/wav");
        let header = WavHeader::parse(&captured.bytes).unwrap();
        assert_eq!(header.sample_rate, 16_000);
        assert_eq!(header.data_len, 320 * 2);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stop_signal_ends_recording() {
        let (source, stops) = ScriptedSource::new(vec![vec![0.3; 80]], true);
        let session = RecordingSession::new(source);
        let levels = session.levels();

        let captured = session
            .record_until(tokio::time::sleep(Duration::from_millis(20)))
            .await
            .unwrap();

        assert!(!captured.bytes.is_empty());
        assert_eq!(stops.load(Ordering::SeqCst), 1);
        let level = *levels.borrow();
        assert!((level.peak - 0.3).abs() < 1e-6);
    }

    #[tokio::test]
    async fn silent_session_still_releases_source() {
        let (source, stops) = ScriptedSource::new(Vec::new(), false);
        let result = RecordingSession::new(source)
            .record_until(std::future::pending())
            .await;

        assert!(matches!(result, Err(CaptureError::NothingRecorded)));
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn misaligned_capture_releases_source() {
        let (mut source, stops) = ScriptedSource::new(vec![vec![0.1; 3]], false);
        source.channels = 2;
        let result = RecordingSession::new(source)
            .record_until(std::future::pending())
            .await;

        assert!(matches!(result, Err(CaptureError::Audio(_))));
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dropping_session_releases_source() {
        let (source, stops) = ScriptedSource::new(Vec::new(), true);
        let session = RecordingSession::new(source);

        let cancelled = tokio::time::timeout(
            Duration::from_millis(10),
            session.record_until(std::future::pending()),
        )
        .await;

        assert!(cancelled.is_err());
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn level_of_silence_is_zero() {
        assert_eq!(LevelFrame::measure(&[]), LevelFrame::default());
        let frame = LevelFrame::measure(&[0.0, 0.0]);
        assert_eq!(frame.rms, 0.0);
        assert_eq!(frame.peak, 0.0);
    }

    #[test]
    fn level_measures_rms_and_peak() {
        let frame = LevelFrame::measure(&[0.5, -0.5, 0.5, -1.0]);
        assert!((frame.peak - 1.0).abs() < 1e-6);
        assert!((frame.rms - (1.75f32 / 4.0).sqrt()).abs() < 1e-6);
    }
}
