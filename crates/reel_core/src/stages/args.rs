//! Invocation builders for each stage.
//!
//! Builders are pure: they only describe the command. Running it is the
//! executor's job.

use std::path::Path;

use crate::config::EncodingSettings;
use crate::process::Invocation;

use super::filter::subtitles_filter;
use super::StageKind;

fn ffmpeg(program: &Path, stage: StageKind) -> Invocation {
    Invocation::new(program, stage.name()).args(["-y", "-hide_banner"])
}

/// Video encoding flags shared by every re-encoding stage.
fn video_encoding(enc: &EncodingSettings) -> Vec<String> {
    vec![
        "-c:v".into(),
        enc.video_codec.clone(),
        "-preset".into(),
        enc.preset.clone(),
        "-crf".into(),
        enc.crf.to_string(),
        "-pix_fmt".into(),
        "yuv420p".into(),
    ]
}

fn normalize_filter(enc: &EncodingSettings) -> String {
    format!("scale={}:{},fps={}", enc.width, enc.height, enc.frame_rate)
}

/// Format seconds for command arguments.
pub fn secs_arg(secs: f64) -> String {
    format!("{:.3}", secs)
}

/// Slow (or speed up) a clip by `factor`, normalised and without audio.
pub fn speed_adjust(
    program: &Path,
    enc: &EncodingSettings,
    source: &Path,
    factor: f64,
    output: &Path,
) -> Invocation {
    ffmpeg(program, StageKind::SpeedAdjust)
        .input(source)
        .arg("-vf")
        .arg(format!("setpts=PTS/{:.6},{}", factor, normalize_filter(enc)))
        .arg("-an")
        .args(video_encoding(enc))
        .args(["-movflags", "+faststart"])
        .output(output)
}

/// Cut `duration` seconds starting at `start`, normalised and without audio.
pub fn trim(
    program: &Path,
    enc: &EncodingSettings,
    source: &Path,
    start: f64,
    duration: f64,
    output: &Path,
) -> Invocation {
    ffmpeg(program, StageKind::Trim)
        .arg("-ss")
        .arg(secs_arg(start))
        .input(source)
        .arg("-t")
        .arg(secs_arg(duration))
        .arg("-vf")
        .arg(normalize_filter(enc))
        .arg("-an")
        .args(video_encoding(enc))
        .args(["-movflags", "+faststart"])
        .output(output)
        .expected_duration(duration)
}

/// Attach the narration as the only audio track.
pub fn mux_audio(
    program: &Path,
    enc: &EncodingSettings,
    video: &Path,
    audio: &Path,
    output: &Path,
) -> Invocation {
    ffmpeg(program, StageKind::MuxAudio)
        .input(video)
        .input(audio)
        .args(["-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy"])
        .arg("-c:a")
        .arg(&enc.audio_codec)
        .arg("-b:a")
        .arg(&enc.audio_bitrate)
        .arg("-shortest")
        .output(output)
}

/// Stream-copy the clips named in `list` into one file.
pub fn concatenate(program: &Path, list: &Path, clips: &[impl AsRef<Path>], output: &Path) -> Invocation {
    let invocation = ffmpeg(program, StageKind::Concatenate)
        .args(["-f", "concat", "-safe", "0"])
        .input(list)
        .args(["-c", "copy"])
        .output(output)
        .scratch_file(list);
    clips
        .iter()
        .fold(invocation, |inv, clip| inv.declares_input(clip.as_ref()))
}

/// Burn an SRT track into the picture; audio passes through.
#[allow(clippy::too_many_arguments)]
pub fn burn_subtitles(
    program: &Path,
    enc: &EncodingSettings,
    video: &Path,
    srt: &Path,
    fonts_dir: Option<&Path>,
    original_size: (u32, u32),
    force_style: &str,
    output: &Path,
) -> Invocation {
    ffmpeg(program, StageKind::BurnSubtitles)
        .input(video)
        .declares_input(srt)
        .arg("-vf")
        .arg(subtitles_filter(srt, fonts_dir, original_size, force_style))
        .args(video_encoding(enc))
        .args(["-c:a", "copy", "-movflags", "+faststart"])
        .output(output)
}

/// Composite an image over the whole video at `position`.
pub fn overlay_watermark(
    program: &Path,
    enc: &EncodingSettings,
    video: &Path,
    image: &Path,
    position: &str,
    output: &Path,
) -> Invocation {
    ffmpeg(program, StageKind::OverlayWatermark)
        .input(video)
        .input(image)
        .arg("-filter_complex")
        .arg(format!("[0:v][1:v]overlay={}[v]", position))
        .args(["-map", "[v]", "-map", "0:a?"])
        .args(video_encoding(enc))
        .args(["-c:a", "copy", "-movflags", "+faststart"])
        .output(output)
}

/// Mix looped, attenuated music under the narration.
pub fn mix_background_music(
    program: &Path,
    enc: &EncodingSettings,
    video: &Path,
    music: &Path,
    volume: f64,
    output: &Path,
) -> Invocation {
    ffmpeg(program, StageKind::MixBackgroundMusic)
        .input(video)
        .args(["-stream_loop", "-1"])
        .input(music)
        .arg("-filter_complex")
        .arg(format!(
            "[1:a]volume={}[bgm];[0:a][bgm]amix=inputs=2:duration=shortest:dropout_transition=0[a]",
            volume
        ))
        .args(["-map", "0:v", "-map", "[a]", "-c:v", "copy"])
        .arg("-c:a")
        .arg(&enc.audio_codec)
        .arg("-b:a")
        .arg(&enc.audio_bitrate)
        .args(["-shortest", "-movflags", "+faststart"])
        .output(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(inv: &Invocation) -> Vec<String> {
        inv.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    fn enc() -> EncodingSettings {
        EncodingSettings::default()
    }

    #[test]
    fn speed_adjust_slows_with_setpts() {
        let inv = speed_adjust(
            Path::new("ffmpeg"),
            &enc(),
            Path::new("/p/A/v.mp4"),
            0.8,
            Path::new("/w/process_001.mp4"),
        );
        let a = args(&inv);
        assert_eq!(&a[..4], ["-y", "-hide_banner", "-i", "/p/A/v.mp4"]);
        assert!(a.contains(&"setpts=PTS/0.800000,scale=720:1280,fps=30".to_string()));
        assert!(a.contains(&"-an".to_string()));
        assert_eq!(a.last().unwrap(), "/w/process_001.mp4");
        assert_eq!(inv.label, "Speed adjust");
    }

    #[test]
    fn trim_seeks_before_input() {
        let inv = trim(
            Path::new("ffmpeg"),
            &enc(),
            Path::new("/p/A/v.mp4"),
            3.0,
            4.0,
            Path::new("/w/process_001.mp4"),
        );
        let a = args(&inv);
        let ss = a.iter().position(|x| x == "-ss").unwrap();
        let input = a.iter().position(|x| x == "-i").unwrap();
        assert!(ss < input);
        assert_eq!(a[ss + 1], "3.000");
        let t = a.iter().position(|x| x == "-t").unwrap();
        assert_eq!(a[t + 1], "4.000");
        assert!(a.contains(&"libx264".to_string()));
        assert!(a.contains(&"23".to_string()));
        assert_eq!(inv.expected_secs, Some(4.0));
    }

    #[test]
    fn mux_maps_video_and_new_audio() {
        let inv = mux_audio(
            Path::new("ffmpeg"),
            &enc(),
            Path::new("/w/process_001.mp4"),
            Path::new("/p/A/n.mp3"),
            Path::new("/w/scene_001.mp4"),
        );
        let a = args(&inv).join(" ");
        assert!(a.contains("-map 0:v:0 -map 1:a:0 -c:v copy -c:a aac -b:a 128k"));
        assert_eq!(inv.inputs.len(), 2);
    }

    #[test]
    fn concatenate_stream_copies_and_cleans_list() {
        let clips = vec![PathBuf::from("/w/scene_001.mp4"), PathBuf::from("/w/scene_002.mp4")];
        let inv = concatenate(
            Path::new("ffmpeg"),
            Path::new("/w/filelist.txt"),
            &clips,
            Path::new("/w/merge.mp4"),
        );
        let a = args(&inv).join(" ");
        assert!(a.contains("-f concat -safe 0 -i /w/filelist.txt -c copy /w/merge.mp4"));
        assert_eq!(inv.scratch, vec![PathBuf::from("/w/filelist.txt")]);
        assert_eq!(inv.inputs.len(), 3);
    }

    #[test]
    fn burn_subtitles_copies_audio() {
        let inv = burn_subtitles(
            Path::new("ffmpeg"),
            &enc(),
            Path::new("/w/merge.mp4"),
            Path::new("/w/subtitles.srt"),
            None,
            (1080, 1920),
            "Fontsize=55",
            Path::new("/w/merge_subtitle.mp4"),
        );
        let a = args(&inv);
        let vf = a.iter().position(|x| x == "-vf").unwrap();
        assert!(a[vf + 1].starts_with("subtitles=filename=/w/subtitles.srt"));
        assert!(a.join(" ").contains("-c:a copy"));
    }

    #[test]
    fn watermark_uses_position() {
        let inv = overlay_watermark(
            Path::new("ffmpeg"),
            &enc(),
            Path::new("/w/merge_subtitle.mp4"),
            Path::new("/p/logo.png"),
            "W-w-10:H-h-10",
            Path::new("/w/merge_subtitle_watermark.mp4"),
        );
        assert!(args(&inv).contains(&"[0:v][1:v]overlay=W-w-10:H-h-10[v]".to_string()));
    }

    #[test]
    fn music_is_looped_and_attenuated() {
        let inv = mix_background_music(
            Path::new("ffmpeg"),
            &enc(),
            Path::new("/w/merge_subtitle.mp4"),
            Path::new("/p/bgm.mp3"),
            0.15,
            Path::new("/w/final.mp4"),
        );
        let a = args(&inv);
        let joined = a.join(" ");
        assert!(joined.contains("-stream_loop -1 -i /p/bgm.mp3"));
        assert!(joined.contains("[1:a]volume=0.15[bgm]"));
        assert!(joined.contains("duration=shortest"));
        assert!(joined.contains("-c:v copy"));
    }
}
