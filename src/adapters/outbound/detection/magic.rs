use crate::ports::detection::{FileType, FileTypeDetector};

/// Detects common media and document types from their signatures
#[derive(Debug, Clone, Copy, Default)]
pub struct MagicByteDetector;

impl MagicByteDetector {
    pub fn new() -> Self {
        Self
    }
}

impl FileTypeDetector for MagicByteDetector {
    fn detect(&self, data: &[u8]) -> Option<FileType> {
        let (mime, ext) = sniff(data)?;
        Some(FileType::new(mime, ext))
    }
}

fn sniff(data: &[u8]) -> Option<(&'static str, &'static str)> {
    // PNG
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some(("image/png", "png"));
    }

    // JPEG
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(("image/jpeg", "jpg"));
    }

    // GIF
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some(("image/gif", "gif"));
    }

    // RIFF containers
    if data.len() >= 12 && data.starts_with(b"RIFF") {
        match &data[8..12] {
            b"WEBP" => return Some(("image/webp", "webp")),
            b"WAVE" => return Some(("audio/wav", "wav")),
            b"AVI " => return Some(("video/x-msvideo", "avi")),
            _ => {}
        }
    }

    // ISO base media (MP4, MOV, AVIF, HEIC)
    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        return Some(match &data[8..12] {
            b"avif" | b"avis" => ("image/avif", "avif"),
            b"heic" | b"heix" | b"mif1" | b"msf1" => ("image/heic", "heic"),
            b"qt  " => ("video/quicktime", "mov"),
            b"M4A " => ("audio/mp4", "m4a"),
            _ => ("video/mp4", "mp4"),
        });
    }

    // TIFF (little-endian, big-endian)
    if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A]) {
        return Some(("image/tiff", "tif"));
    }

    if data.starts_with(b"BM") && data.len() >= 14 {
        return Some(("image/bmp", "bmp"));
    }

    if data.starts_with(&[0x00, 0x00, 0x01, 0x00]) {
        return Some(("image/x-icon", "ico"));
    }

    if data.starts_with(b"%PDF") {
        return Some(("application/pdf", "pdf"));
    }

    // Matroska / WebM
    if data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return Some(("video/webm", "webm"));
    }

    if data.starts_with(b"OggS") {
        return Some(("audio/ogg", "ogg"));
    }

    if data.starts_with(b"fLaC") {
        return Some(("audio/flac", "flac"));
    }

    // MP3 with ID3 tag or bare frame sync
    if data.starts_with(b"ID3") || (data.len() >= 2 && data[0] == 0xFF && data[1] & 0xE0 == 0xE0) {
        return Some(("audio/mpeg", "mp3"));
    }

    // ZIP-based formats (DOCX, XLSX, ...) are reported as plain ZIP
    if data.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
        return Some(("application/zip", "zip"));
    }

    if data.starts_with(&[0x1F, 0x8B]) {
        return Some(("application/gzip", "gz"));
    }

    None
}
