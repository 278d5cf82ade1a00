//! Microphone input using cpal
//! Captures at the device's native rate, down-mixed to mono

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{
    Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig, SupportedStreamConfig,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::{CaptureError, SampleSource};
use crate::audio::AudioProfile;

/// The default input device, not yet recording
pub struct Microphone {
    device: Device,
    supported_config: SupportedStreamConfig,
}

/// An open input stream. Dropping it releases the device.
pub struct MicrophoneStream {
    receiver: mpsc::Receiver<Vec<f32>>,
    running: Arc<AtomicBool>,
    stream: Option<Stream>,
    profile: AudioProfile,
}

impl Microphone {
    /// Acquire the default input device. A missing device or refused
    /// configuration surfaces as [`CaptureError::PermissionDenied`].
    pub fn open() -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| CaptureError::PermissionDenied {
                reason: "no input device available".into(),
            })?;

        let supported_config =
            device
                .default_input_config()
                .map_err(|e| CaptureError::PermissionDenied {
                    reason: e.to_string(),
                })?;

        tracing::debug!(
            device_name = ?device.name(),
            native_sample_rate = supported_config.sample_rate().0,
            native_channels = supported_config.channels(),
            native_format = ?supported_config.sample_format(),
            "microphone opened"
        );

        Ok(Self {
            device,
            supported_config,
        })
    }

    pub fn start(self) -> Result<MicrophoneStream, CaptureError> {
        let (tx, rx) = mpsc::channel::<Vec<f32>>(100);
        let running = Arc::new(AtomicBool::new(true));

        let native_channels = self.supported_config.channels() as usize;
        let profile = AudioProfile {
            sample_rate: self.supported_config.sample_rate().0,
            channels: 1,
        };
        let config: StreamConfig = self.supported_config.clone().into();

        let stream = match self.supported_config.sample_format() {
            SampleFormat::I16 => {
                self.build_stream::<i16>(&config, tx, running.clone(), native_channels)?
            }
            SampleFormat::F32 => {
                self.build_stream::<f32>(&config, tx, running.clone(), native_channels)?
            }
            format => {
                return Err(CaptureError::Device(format!(
                    "unsupported sample format: {format:?}"
                )))
            }
        };

        stream
            .play()
            .map_err(|e| CaptureError::PermissionDenied {
                reason: e.to_string(),
            })?;

        Ok(MicrophoneStream {
            receiver: rx,
            running,
            stream: Some(stream),
            profile,
        })
    }

    fn build_stream<T>(
        &self,
        config: &StreamConfig,
        tx: mpsc::Sender<Vec<f32>>,
        running: Arc<AtomicBool>,
        native_channels: usize,
    ) -> Result<Stream, CaptureError>
    where
        T: SizedSample + Send + 'static,
        f32: FromSample<T>,
    {
        let err_running = running.clone();
        self.device
            .build_input_stream(
                config,
                move |data: &[T], _: &cpal::InputCallbackInfo| {
                    if !running.load(Ordering::SeqCst) {
                        return;
                    }
                    let mono = to_mono_f32(data, native_channels);
                    if !mono.is_empty() && tx.try_send(mono).is_err() {
                        tracing::trace!("microphone chunk dropped");
                    }
                },
                move |err| {
                    tracing::error!(error = ?err, "microphone stream error");
                    err_running.store(false, Ordering::SeqCst);
                },
                None,
            )
            .map_err(|e| CaptureError::PermissionDenied {
                reason: e.to_string(),
            })
    }
}

#[async_trait(?Send)]
impl SampleSource for MicrophoneStream {
    fn profile(&self) -> AudioProfile {
        self.profile
    }

    async fn next_chunk(&mut self) -> Option<Vec<f32>> {
        if self.stream.is_none() {
            return None;
        }
        self.receiver.recv().await
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        // Dropping the stream closes the device and its sender
        self.stream.take();
    }
}

impl Drop for MicrophoneStream {
    fn drop(&mut self) {
        self.stop();
    }
}

fn to_mono_f32<T>(samples: &[T], channels: usize) -> Vec<f32>
where
    T: Copy,
    f32: FromSample<T>,
{
    if channels <= 1 {
        return samples.iter().map(|&s| f32::from_sample(s)).collect();
    }
    samples
        .chunks(channels)
        .map(|frame| {
            let sum: f32 = frame.iter().map(|&s| f32::from_sample(s)).sum();
            sum / channels as f32
        })
        .collect()
}
