//! Narration playback using cpal
//! Resamples from the clip rate to the device's native rate when they differ

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{
    Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig, SupportedStreamConfig,
};
use rubato::{FftFixedIn, Resampler};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::audio::{decode_pcm16le, WavContainer};

pub struct AudioPlayer {
    device: Device,
    supported_config: SupportedStreamConfig,
}

/// Playback handle. Dropping it stops the sound.
pub struct AudioPlayback {
    _stream: Stream,
    finished: Arc<AtomicBool>,
}

impl AudioPlayback {
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    pub async fn wait(&self) {
        while !self.is_finished() {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

impl AudioPlayer {
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .context("no output device available")?;

        let supported_config = device
            .default_output_config()
            .context("failed to get default output config")?;

        Ok(Self {
            device,
            supported_config,
        })
    }

    pub fn play(&self, wav: &WavContainer) -> Result<AudioPlayback> {
        let native_rate = self.supported_config.sample_rate().0;
        let native_channels = self.supported_config.channels() as usize;
        let config: StreamConfig = self.supported_config.clone().into();

        let header = wav.header();
        let decoded = decode_pcm16le(wav.data(), header.sample_rate, header.channels)
            .context("narration has no playable audio")?;
        let mono = down_mix(decoded.samples(), decoded.channels() as usize);
        let resampled = if decoded.sample_rate() == native_rate {
            mono
        } else {
            resample(&mono, decoded.sample_rate(), native_rate)?
        };
        let samples = Arc::new(expand_to_channels(&resampled, native_channels));

        tracing::debug!(
            source_rate = decoded.sample_rate(),
            native_rate,
            native_channels,
            duration = ?wav.duration(),
            "starting playback"
        );

        let position = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicBool::new(false));

        let stream = match self.supported_config.sample_format() {
            SampleFormat::F32 => {
                self.build_stream::<f32>(&config, samples, position, finished.clone())?
            }
            SampleFormat::I16 => {
                self.build_stream::<i16>(&config, samples, position, finished.clone())?
            }
            format => anyhow::bail!("unsupported sample format: {:?}", format),
        };

        stream.play().context("failed to start playback stream")?;

        Ok(AudioPlayback {
            _stream: stream,
            finished,
        })
    }

    fn build_stream<T>(
        &self,
        config: &StreamConfig,
        samples: Arc<Vec<f32>>,
        position: Arc<AtomicUsize>,
        finished: Arc<AtomicBool>,
    ) -> Result<Stream>
    where
        T: SizedSample + FromSample<f32> + Default + Send + 'static,
    {
        self.device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let pos = position.load(Ordering::SeqCst);
                    let remaining = samples.len().saturating_sub(pos);
                    if remaining == 0 {
                        data.fill(T::default());
                        finished.store(true, Ordering::SeqCst);
                        return;
                    }

                    let to_copy = remaining.min(data.len());
                    for (slot, &sample) in data.iter_mut().zip(&samples[pos..pos + to_copy]) {
                        *slot = T::from_sample(sample);
                    }
                    data[to_copy..].fill(T::default());
                    position.store(pos + to_copy, Ordering::SeqCst);
                },
                move |err| {
                    tracing::error!(error = ?err, "playback stream error");
                },
                None,
            )
            .context("failed to build output stream")
    }
}

fn down_mix(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Result<Vec<f32>> {
    let chunk_size = 1024;
    let mut resampler =
        FftFixedIn::<f32>::new(source_rate as usize, target_rate as usize, chunk_size, 2, 1)
            .context("failed to create resampler")?;

    let mut output = Vec::new();
    for chunk in samples.chunks(resampler.input_frames_next()) {
        let mut input = chunk.to_vec();
        input.resize(resampler.input_frames_next(), 0.0);
        let resampled = resampler
            .process(&[input], None)
            .map_err(|e| anyhow::anyhow!("resampling failed: {e:?}"))?;
        if let Some(channel) = resampled.into_iter().next() {
            output.extend(channel);
        }
    }
    Ok(output)
}

fn expand_to_channels(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .iter()
        .flat_map(|&s| std::iter::repeat(s).take(channels))
        .collect()
}
