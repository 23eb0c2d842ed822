use anyhow::Result;
use ndarray::Array4;
use opencv::{
    core::{Mat, Size, CV_32FC3},
    imgproc,
    prelude::*,
};

/// MoveNet用の入力サイズ
pub const MOVENET_INPUT_SIZE: i32 = 192;

/// YOLO pose系モデル用の入力サイズ
pub const YOLO_POSE_INPUT_SIZE: i32 = 640;

/// OpenCV Mat を MoveNet用の入力テンソルに変換
///
/// - BGR -> RGB
/// - 192x192 にリサイズ
/// - [1, 192, 192, 3] の f32 テンソル (0.0-255.0)
pub fn preprocess_for_movenet(frame: &Mat) -> Result<Array4<f32>> {
    let size = MOVENET_INPUT_SIZE;

    // BGR -> RGB
    let mut rgb = Mat::default();
    imgproc::cvt_color_def(frame, &mut rgb, imgproc::COLOR_BGR2RGB)?;

    let mut resized = Mat::default();
    imgproc::resize(
        &rgb,
        &mut resized,
        Size::new(size, size),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )?;

    let mut float_mat = Mat::default();
    resized.convert_to(&mut float_mat, CV_32FC3, 1.0, 0.0)?;

    // NHWC [1, 192, 192, 3]
    let s = size as usize;
    let mut tensor = Array4::<f32>::zeros((1, s, s, 3));
    let data = float_mat.data_bytes()?;
    let step = float_mat.mat_step().get(0);
    for y in 0..s {
        let row_ptr =
            unsafe { std::slice::from_raw_parts(data.as_ptr().add(y * step) as *const f32, s * 3) };
        for x in 0..s {
            for c in 0..3 {
                tensor[[0, y, x, c]] = row_ptr[x * 3 + c];
            }
        }
    }

    Ok(tensor)
}

/// OpenCV Mat を YOLO pose用の入力テンソルに変換
///
/// - BGR -> RGB
/// - 640x640 にリサイズ
/// - [0, 255] → [0.0, 1.0] 正規化 & NCHW変換 [1, 3, 640, 640]
pub fn preprocess_for_yolo_pose(frame: &Mat) -> Result<Array4<f32>> {
    let size = YOLO_POSE_INPUT_SIZE;

    // BGR -> RGB
    let mut rgb = Mat::default();
    imgproc::cvt_color_def(frame, &mut rgb, imgproc::COLOR_BGR2RGB)?;

    let mut resized = Mat::default();
    imgproc::resize(
        &rgb,
        &mut resized,
        Size::new(size, size),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )?;

    let mut float_mat = Mat::default();
    resized.convert_to(&mut float_mat, CV_32FC3, 1.0, 0.0)?;

    let s = size as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, s, s));
    let data = float_mat.data_bytes()?;
    let step = float_mat.mat_step().get(0);
    for y in 0..s {
        let row_ptr =
            unsafe { std::slice::from_raw_parts(data.as_ptr().add(y * step) as *const f32, s * 3) };
        for x in 0..s {
            for c in 0..3 {
                tensor[[0, c, y, x]] = row_ptr[x * 3 + c] / 255.0;
            }
        }
    }

    Ok(tensor)
}
