use objscope_camera::{FrameBacking, PixelFormat, VideoFrame};
use objscope_preprocess::{frame_to_rgb, Preprocessor};

#[test]
fn cpu_smoke() {
    // Fake white NV12 640×480
    let w = 640; let h = 480;
    let mut bytes = vec![128u8; PixelFormat::Nv12.frame_len(w, h)];
    bytes[..(w*h) as usize].fill(255);

    let frame = VideoFrame {
        backing: FrameBacking::Cpu(bytes),
        format: PixelFormat::Nv12,
        width: w, height: h, stride: w, pts: std::time::Duration::ZERO,
    };

    let rgb = frame_to_rgb(&frame).unwrap();
    assert_eq!(rgb.dimensions(), (640, 480));
    assert_eq!(rgb.get_pixel(320, 240).0, [255, 255, 255]);

    let pp = Preprocessor::new(224, 224);
    let out = pp.run(&rgb).unwrap();
    assert_eq!(out.shape(), &[224, 224, 3]);
    assert!(out.iter().all(|&v| (v - 1.0).abs() < 0.01));

    let nchw = pp.run_nchw(&rgb).unwrap();
    assert_eq!(nchw.shape(), &[1, 3, 224, 224]);
}

#[test]
fn padded_camera_frame_smoke() {
    // 640x480 NV12 with rows padded to 704 bytes, padding filled with junk
    let (w, h, stride) = (640u32, 480u32, 704usize);
    let mut bytes = vec![0u8; stride * h as usize + stride * (h as usize / 2)];
    for (j, row) in bytes.chunks_mut(stride).enumerate() {
        let fill = if j < h as usize { 255 } else { 128 };
        row[..w as usize].fill(fill);
    }

    let frame = VideoFrame {
        backing: FrameBacking::Cpu(bytes),
        format: PixelFormat::Nv12,
        width: w, height: h, stride: stride as u32, pts: std::time::Duration::ZERO,
    };
    let rgb = frame_to_rgb(&frame).unwrap();
    assert!(rgb.pixels().all(|p| p.0 == [255, 255, 255]));
}
