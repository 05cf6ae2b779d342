//! Live microphone capture. The cpal callback downmixes to mono and hands
//! chunks to a bounded channel; the session worker drains that channel
//! without blocking on its tick cadence.

use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Device, SampleFormat, Stream, StreamConfig};
use tracing::warn;

#[derive(Clone, Debug)]
pub struct CaptureConfig {
    pub device_name: Option<String>,
    pub latency_ms: RangeInclusive<u32>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_name: None,
            latency_ms: default_latency_range(),
        }
    }
}

fn default_latency_range() -> RangeInclusive<u32> {
    100..=200
}

/// A running input stream. Chunks arrive at the device's native rate,
/// already mono.
pub struct LiveCapture {
    stream: Stream,
    receiver: Receiver<Vec<f32>>,
    finished: Arc<AtomicBool>,
    sample_rate: u32,
}

impl LiveCapture {
    pub fn start(config: &CaptureConfig) -> Result<Self> {
        let device = select_device(config)?;
        let setup = build_stream(&device, config)?;
        setup
            .stream
            .play()
            .context("failed to start live capture stream")?;
        Ok(Self {
            stream: setup.stream,
            receiver: setup.receiver,
            finished: setup.finished,
            sample_rate: setup.sample_rate,
        })
    }

    /// Next pending chunk, if any. Never blocks.
    pub fn try_chunk(&self) -> Option<Vec<f32>> {
        match self.receiver.try_recv() {
            Ok(chunk) => Some(chunk),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn stop(&self) {
        self.finished.store(true, Ordering::SeqCst);
        let _ = self.stream.pause();
    }
}

impl Drop for LiveCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

struct StreamSetup {
    stream: Stream,
    receiver: Receiver<Vec<f32>>,
    finished: Arc<AtomicBool>,
    sample_rate: u32,
}

fn select_device(config: &CaptureConfig) -> Result<Device> {
    let host = cpal::default_host();
    if let Some(name) = config.device_name.as_deref() {
        for device in host
            .input_devices()
            .context("listing input devices failed")?
        {
            if device.name().map(|n| n == name).unwrap_or(false) {
                return Ok(device);
            }
        }
        return Err(anyhow!("input device '{}' not found", name));
    }
    host.default_input_device()
        .context("no default input device available")
}

fn build_stream(device: &Device, config: &CaptureConfig) -> Result<StreamSetup> {
    let supported = device
        .default_input_config()
        .context("failed to query default input config")?;
    let stream_config = StreamConfig {
        channels: supported.channels(),
        sample_rate: supported.sample_rate(),
        buffer_size: BufferSize::Default,
    };
    let capacity = channel_capacity(stream_config.sample_rate.0, &config.latency_ms);
    let (sender, receiver) = mpsc::sync_channel::<Vec<f32>>(capacity);
    let finished = Arc::new(AtomicBool::new(false));
    let stream = build_input_stream(
        device,
        &stream_config,
        supported.sample_format(),
        Arc::new(sender),
        finished.clone(),
    )?;
    Ok(StreamSetup {
        stream,
        receiver,
        finished,
        sample_rate: stream_config.sample_rate.0,
    })
}

fn build_input_stream(
    device: &Device,
    config: &StreamConfig,
    format: SampleFormat,
    sender: Arc<SyncSender<Vec<f32>>>,
    finished: Arc<AtomicBool>,
) -> Result<Stream> {
    let err_fn = |err| warn!(error = %err, "audio input stream error");
    let channels = config.channels as usize;
    match format {
        SampleFormat::F32 => device.build_input_stream(
            config,
            {
                let sender = sender.clone();
                let finished = finished.clone();
                move |data: &[f32], _| emit_from_slice(data, channels, &sender, &finished)
            },
            err_fn,
            None,
        ),
        SampleFormat::I16 => device.build_input_stream(
            config,
            {
                let sender = sender.clone();
                let finished = finished.clone();
                move |data: &[i16], _| {
                    let converted: Vec<f32> = data
                        .iter()
                        .map(|&sample| sample as f32 / i16::MAX as f32)
                        .collect();
                    emit_from_slice(&converted, channels, &sender, &finished)
                }
            },
            err_fn,
            None,
        ),
        SampleFormat::U16 => device.build_input_stream(
            config,
            {
                let sender = sender.clone();
                let finished = finished.clone();
                move |data: &[u16], _| {
                    let converted: Vec<f32> = data
                        .iter()
                        .map(|&sample| (sample as f32 / u16::MAX as f32) * 2.0 - 1.0)
                        .collect();
                    emit_from_slice(&converted, channels, &sender, &finished)
                }
            },
            err_fn,
            None,
        ),
        other => return Err(anyhow!("unsupported input sample format {:?}", other)),
    }
    .map_err(|err| anyhow!(err))
    .context("failed to build input stream")
}

fn emit_from_slice(
    data: &[f32],
    channels: usize,
    sender: &Arc<SyncSender<Vec<f32>>>,
    finished: &Arc<AtomicBool>,
) {
    if finished.load(Ordering::Relaxed) || channels == 0 {
        return;
    }
    let mut mono = Vec::with_capacity(data.len() / channels);
    for frame in data.chunks(channels) {
        mono.push(mix_to_mono(frame));
    }
    // The device callback must never block; a full channel drops the chunk.
    let _ = sender.try_send(mono);
}

fn channel_capacity(sample_rate: u32, latency_ms: &RangeInclusive<u32>) -> usize {
    let max_latency = (*latency_ms.end()).max(*latency_ms.start());
    let frames = (sample_rate as u64 * max_latency as u64) / 1000;
    let approx_chunks = (frames / 1024).max(2);
    approx_chunks as usize
}

pub fn mix_to_mono(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    frame.iter().sum::<f32>() / frame.len() as f32
}

#[cfg(test)]
mod tests {
    use super::{channel_capacity, mix_to_mono};

    #[test]
    fn averages_samples_in_frame() {
        let frame = [0.8, 0.2];
        let mono = mix_to_mono(&frame);
        assert!((mono - 0.5).abs() < 1e-6);
    }

    #[test]
    fn capacity_scales_with_latency_budget() {
        assert_eq!(channel_capacity(48_000, &(100..=200)), 9);
        assert!(channel_capacity(8_000, &(1..=1)) >= 2);
    }
}
