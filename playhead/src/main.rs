use std::sync::{Arc, mpsc};
use std::thread;

use clap::Parser;

use playhead_core::{AudioRenderer, PacketQueue, PcmReader, StopToken};
use playhead_media::{AudioDecoder, MediaSource, VideoDecoder};

mod driver;
mod output;

#[derive(Parser, Debug)]
#[command(name = "playhead")]
#[command(about = "Minimal FFmpeg-based media player")]
struct Args {
    /// Media file or URL to play
    input: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("playhead=info".parse()?)
                .add_directive("playhead_core=info".parse()?)
                .add_directive("playhead_media=info".parse()?),
        )
        .init();

    let source = MediaSource::open(&args.input)?;
    print_probe(&args.input, &source);

    // Create shutdown token shared by every part of the pipeline
    let stop = Arc::new(StopToken::new());

    // Set up the audio pipeline: a packet queue drained by a decoder that
    // runs inside the device callback. The decoder is sized for whatever
    // configuration the output device agreed to.
    let mut audio_queue = None;
    let mut audio_stream = None;
    if let Some(info) = source.audio().cloned() {
        let out = output::AudioOutput::negotiate(info.sample_rate, info.channels)?;
        println!(
            "Audio: {} ch {} Hz -> {} ch {} Hz (f32)",
            info.channels,
            info.sample_rate,
            out.channels(),
            out.sample_rate()
        );

        let parameters = source
            .audio_parameters()
            .ok_or("audio stream lost its parameters")?;
        let decoder = AudioDecoder::new(parameters, out.sample_rate(), out.channels())?;

        let queue = PacketQueue::new(Arc::clone(&stop));
        let reader = PcmReader::new(Arc::clone(&queue), Box::new(decoder));
        audio_stream = Some(out.start(AudioRenderer::new(reader))?);
        audio_queue = Some(queue);
    }

    // Set up the video decoder on this thread before the source moves away
    let mut video_decoder = None;
    if let Some(info) = source.video() {
        let parameters = source
            .video_parameters()
            .ok_or("video stream lost its parameters")?;
        video_decoder = Some(VideoDecoder::new(parameters, info.time_base)?);
    }

    // Demux on a dedicated thread so the main thread can wait for Ctrl+C
    let driver_stop = Arc::clone(&stop);
    let driver_handle =
        thread::spawn(move || driver::run(source, audio_queue, video_decoder, driver_stop));

    // Wait for Ctrl+C
    let (quit_tx, quit_rx) = mpsc::channel();
    let handler_stop = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        handler_stop.request_stop();
        let _ = quit_tx.send(());
    })?;

    let _ = quit_rx.recv();
    println!("\nShutting down...");

    match driver_handle.join() {
        Ok(summary) => println!(
            "Demuxed {} audio and {} video packets, decoded {} video frames.",
            summary.audio_packets, summary.video_packets, summary.video_frames
        ),
        Err(_) => eprintln!("[driver] demux thread panicked"),
    }

    // Tear down the audio stream before exiting
    drop(audio_stream);

    println!("Done.");
    Ok(())
}

fn print_probe(path: &str, source: &MediaSource) {
    println!("Playing {path}");
    if let Some(duration) = source.duration_seconds() {
        println!("Duration: {duration:.1}s");
    }
    if let Some(audio) = source.audio() {
        println!(
            "Audio stream #{}: {} {} Hz {} ch",
            audio.index, audio.codec, audio.sample_rate, audio.channels
        );
    }
    if let Some(video) = source.video() {
        println!(
            "Video stream #{}: {} {}x{}",
            video.index, video.codec, video.width, video.height
        );
    }
}
