use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{bounded, Receiver};
use image::{RgbImage, RgbaImage};
use log::{info, warn};
use objscope_overlay::{fit_frame, load_font, ImageCanvas, OverlayRenderer, Repaint};
use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::Keycode;
use sdl2::pixels::PixelFormatEnum;
use sdl2::render::Canvas;
use sdl2::video::Window;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::AppConfig;
use crate::pipeline::{spawn_analyzer, Analysis, BoxedDetector, Control};

const TITLE: &str = "objscope";

fn init_sdl2(width: u32, height: u32) -> Result<(sdl2::Sdl, Canvas<Window>)> {
    let sdl_context = sdl2::init().map_err(|e| anyhow!("Failed to initialize SDL2: {}", e))?;
    let video_subsystem = sdl_context.video().map_err(|e| anyhow!("Failed to get SDL2 video subsystem: {}", e))?;
    let window = video_subsystem
        .window(TITLE, width, height)
        .position_centered()
        .resizable()
        .build()
        .map_err(|e| anyhow!("Failed to build SDL2 window: {}", e))?;

    let canvas = window
        .into_canvas()
        .accelerated()
        .build()
        .map_err(|e| anyhow!("Failed to build SDL2 canvas: {}", e))?;

    Ok((sdl_context, canvas))
}

fn display_frame(canvas: &mut Canvas<Window>, view: &RgbaImage) -> Result<()> {
    let (width, height) = view.dimensions();
    if width == 0 || height == 0 {
        return Ok(());
    }
    let creator = canvas.texture_creator();
    let mut texture = creator.create_texture_streaming(PixelFormatEnum::RGB24, width, height)?;

    texture
        .with_lock(None, |buffer: &mut [u8], pitch: usize| {
            for (y, row) in view.rows().enumerate() {
                let dest = &mut buffer[y * pitch..y * pitch + 3 * width as usize];
                for (x, pixel) in row.enumerate() {
                    dest[x * 3..x * 3 + 3].copy_from_slice(&pixel.0[..3]);
                }
            }
        })
        .map_err(|e| anyhow!("Failed to lock texture: {}", e))?;

    canvas.clear();
    canvas.copy(&texture, None, None).map_err(|e| anyhow!("Failed to copy texture: {}", e))?;
    canvas.present();
    Ok(())
}

/// UI thread: owns the window and the overlay renderer, and repaints on
/// request. Frames and detections come from the analyzer thread.
pub fn run(config: AppConfig, stills: Option<PathBuf>, detector: BoxedDetector) -> Result<()> {
    let (sdl, mut canvas) = init_sdl2(config.view.width, config.view.height)?;
    let mut events = sdl.event_pump().map_err(|e| anyhow!("Failed to get SDL2 event pump: {}", e))?;

    let font = match &config.overlay.font_path {
        Some(path) => Some(load_font(path).context("loading overlay font")?),
        None => None,
    };

    let (repaint_tx, repaint_rx) = bounded::<Repaint>(1);
    let mut overlay = OverlayRenderer::new(config.overlay.style.clone());
    let (view_w, view_h) = canvas.window().size();
    overlay.set_view_size(view_w, view_h);
    overlay.attach(repaint_tx);

    let (control_tx, control_rx) = bounded::<Control>(4);
    let (results_tx, results_rx): (_, Receiver<Analysis>) = bounded(1);
    let analyzer = spawn_analyzer(config, stills, detector, control_rx, results_tx)?;

    let mut frame: Option<RgbImage> = None;
    'main: loop {
        for event in events.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown { keycode: Some(Keycode::Escape), .. } => break 'main,
                Event::KeyDown { keycode: Some(Keycode::C), repeat: false, .. } => {
                    if control_tx.try_send(Control::SwitchCamera).is_err() {
                        warn!("camera switch already pending");
                    }
                }
                Event::Window { win_event: WindowEvent::SizeChanged(w, h), .. } => {
                    overlay.set_view_size(w.max(0) as u32, h.max(0) as u32);
                    // re-fit the current batch to the new view
                    if let Some(f) = &frame {
                        overlay.update_detections(overlay.detections().to_vec(), f.width(), f.height());
                    }
                }
                _ => {}
            }
        }

        if let Ok(analysis) = results_rx.try_recv() {
            if let Err(e) = canvas.window_mut().set_title(&format!("{TITLE} | {}", analysis.status())) {
                warn!("could not set window title: {e}");
            }
            let (w, h) = analysis.frame.dimensions();
            frame = Some(analysis.frame);
            overlay.update_detections(analysis.detections, w, h);
        } else if results_rx.is_empty() && analyzer.is_finished() {
            info!("analyzer stopped");
            break;
        }

        if repaint_rx.try_recv().is_ok() {
            if let Some(f) = &frame {
                let (vw, vh) = overlay.view_size();
                let mut view = fit_frame(f, vw, vh);
                let text_size = overlay.style().text_size;
                match &font {
                    Some(font) => overlay.paint(&mut ImageCanvas::new(&mut view, text_size).with_font(font)),
                    None => overlay.paint(&mut ImageCanvas::new(&mut view, text_size)),
                }
                display_frame(&mut canvas, &view)?;
            }
        } else {
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    overlay.detach();
    drop(control_tx);
    drop(results_rx);
    if analyzer.join().is_err() {
        warn!("analyzer thread panicked");
    }
    info!("Done. Exiting.");
    Ok(())
}
