//! Post-processing filters on interleaved RGB images stored as `f32`. Borders are handled by reflecting
//! around the edge pixel (`dcb|abcd|cba`)

use rayon::prelude::*;

const CHANNELS: usize = 3;

/// Channel value at or below which a pixel counts as dark
pub(crate) const DARK_THRESHOLD: f32 = 40.0;

const GAUSSIAN_3X3: [f32; 3] = [0.25, 0.5, 0.25];

fn reflect_101(idx: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let len = len as isize;
    let mut idx = idx;
    if idx < 0 {
        idx = -idx;
    }
    if idx >= len {
        idx = 2 * (len - 1) - idx;
    }
    idx as usize
}

/// Replaces every pixel whose channels are all at or below [DARK_THRESHOLD] by the mean of its eight
/// neighbours. Neighbour means are taken from the unmodified image and truncated to whole values
pub(crate) fn fill_dark_pixels(image: &[f32], width: usize, height: usize) -> Vec<f32> {
    let mut filled = image.to_vec();
    filled
        .par_chunks_mut((width * CHANNELS).max(1))
        .enumerate()
        .for_each(|(row, filled_row)| {
            for col in 0..width {
                let offset = col * CHANNELS;
                let pixel = &image[(row * width + col) * CHANNELS..][..CHANNELS];
                if pixel.iter().any(|channel| *channel > DARK_THRESHOLD) {
                    continue;
                }
                for channel in 0..CHANNELS {
                    let mut sum = 0.0;
                    for dr in -1isize..=1 {
                        for dc in -1isize..=1 {
                            if dr == 0 && dc == 0 {
                                continue;
                            }
                            let r = reflect_101(row as isize + dr, height);
                            let c = reflect_101(col as isize + dc, width);
                            sum += image[(r * width + c) * CHANNELS + channel];
                        }
                    }
                    filled_row[offset + channel] = (sum / 8.0).trunc();
                }
            }
        });
    filled
}

/// 3x3 Gaussian blur with the separable kernel `[1, 2, 1] / 4`
pub(crate) fn gaussian_blur_3x3(image: &[f32], width: usize, height: usize) -> Vec<f32> {
    let row_len = (width * CHANNELS).max(1);

    let mut horizontal = vec![0.0; image.len()];
    horizontal
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(row, out_row)| {
            for col in 0..width {
                for channel in 0..CHANNELS {
                    out_row[col * CHANNELS + channel] = GAUSSIAN_3X3
                        .iter()
                        .enumerate()
                        .map(|(k, weight)| {
                            let c = reflect_101(col as isize + k as isize - 1, width);
                            weight * image[(row * width + c) * CHANNELS + channel]
                        })
                        .sum();
                }
            }
        });

    let mut blurred = vec![0.0; image.len()];
    blurred
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(row, out_row)| {
            for col in 0..width {
                for channel in 0..CHANNELS {
                    out_row[col * CHANNELS + channel] = GAUSSIAN_3X3
                        .iter()
                        .enumerate()
                        .map(|(k, weight)| {
                            let r = reflect_101(row as isize + k as isize - 1, height);
                            weight * horizontal[(r * width + col) * CHANNELS + channel]
                        })
                        .sum();
                }
            }
        });
    blurred
}

/// Mirrors every row of the image
pub(crate) fn flip_left_right(image: &mut [f32], width: usize) {
    image
        .par_chunks_mut((width * CHANNELS).max(1))
        .for_each(|row| {
            for col in 0..width / 2 {
                for channel in 0..CHANNELS {
                    row.swap(
                        col * CHANNELS + channel,
                        (width - 1 - col) * CHANNELS + channel,
                    );
                }
            }
        });
}

/// Clamps to `[0, 255]` and drops the fractional part
pub(crate) fn truncate_to_u8_range(image: &mut [f32]) {
    for value in image.iter_mut() {
        *value = value.clamp(0.0, 255.0).trunc();
    }
}

/// Rounds to the nearest 8-bit value
pub(crate) fn quantize(image: &[f32]) -> Vec<u8> {
    image
        .iter()
        .map(|value| value.clamp(0.0, 255.0).round() as u8)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(values: &[f32]) -> Vec<f32> {
        values.iter().flat_map(|v| vec![*v; CHANNELS]).collect()
    }

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 4), 1);
        assert_eq!(reflect_101(4, 4), 2);
        assert_eq!(reflect_101(2, 4), 2);
        assert_eq!(reflect_101(-1, 1), 0);
    }

    #[test]
    fn test_fill_dark_pixel_with_neighbour_mean() {
        #[rustfmt::skip]
        let image = gray(&[
            80.0, 80.0, 80.0,
            80.0, 0.0, 80.0,
            80.0, 80.0, 160.0,
        ]);
        let filled = fill_dark_pixels(&image, 3, 3);
        assert_eq!(&filled[4 * CHANNELS..5 * CHANNELS], &[90.0, 90.0, 90.0]);
        assert_eq!(filled[0], 80.0);
    }

    #[test]
    fn test_bright_channel_keeps_pixel() {
        let image = vec![100.0, 0.0, 0.0, 200.0, 200.0, 200.0];
        let filled = fill_dark_pixels(&image, 2, 1);
        assert_eq!(filled, image);
    }

    #[test]
    fn test_blur_preserves_constant_image() {
        let image = gray(&[50.0; 12]);
        let blurred = gaussian_blur_3x3(&image, 4, 3);
        assert!(blurred.iter().all(|v| (*v - 50.0).abs() < 1e-5));
    }

    #[test]
    fn test_blur_of_impulse() {
        #[rustfmt::skip]
        let image = gray(&[
            0.0, 0.0, 0.0,
            0.0, 16.0, 0.0,
            0.0, 0.0, 0.0,
        ]);
        let blurred = gaussian_blur_3x3(&image, 3, 3);
        assert_eq!(blurred[4 * CHANNELS], 4.0);
        assert_eq!(blurred[0], 4.0);
        assert_eq!(blurred[CHANNELS], 4.0);
    }

    #[test]
    fn test_flip_left_right() {
        let mut image = gray(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        flip_left_right(&mut image, 3);
        assert_eq!(image, gray(&[3.0, 2.0, 1.0, 6.0, 5.0, 4.0]));
    }

    #[test]
    fn test_quantize_clamps() {
        assert_eq!(quantize(&[-3.0, 12.5, 300.0]), vec![0, 13, 255]);
    }
}
