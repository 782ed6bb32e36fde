use super::{ProductionLayout, Timeline, CONCAT_LIST_FILE};
use crate::config::VideoSettings;
use crate::video::ffmpeg::{concat_args, filler_args, segment_args};
use crate::video::ConcatManifest;
use std::path::Path;

const HEADER: &str = "#!/bin/bash\nset -e\ncd \"$(dirname \"$0\")\"\n";

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=+,@".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}

fn command_line(args: &[String]) -> String {
    let mut line = String::from("ffmpeg");
    for arg in args {
        line.push(' ');
        line.push_str(&shell_quote(arg));
    }
    line
}

/// Shell script encoding every scene from its image and voiceover.
pub fn segment_script(timeline: &Timeline, video: &VideoSettings) -> String {
    let mut script = String::from(HEADER);
    script.push_str("# Create individual video segments\n\necho \"Creating video segments...\"\n");

    for scene in &timeline.scenes {
        let args = segment_args(
            &scene.image_path,
            &scene.audio_path,
            scene.duration,
            &scene.output_path,
            video,
        );
        script.push_str(&format!(
            "\n# Scene {}: {}\n{}\n",
            scene.scene_id,
            scene.name,
            command_line(&args)
        ));
    }

    script
}

/// Shell script building the filler clip (if any), writing the concat list
/// and merging into `final/<final_name>.mp4`.
pub fn merge_script(timeline: &Timeline, video: &VideoSettings, final_name: &str) -> String {
    let spacing = timeline.spacing_seconds;
    let final_path = ProductionLayout::final_path(final_name);

    let mut script = String::from(HEADER);
    script.push_str("# Merge all video segments into the final video\n\n");

    if spacing > 0.0 && timeline.len() > 1 {
        let filler = ProductionLayout::filler_path(spacing);
        // segments from create-segments.sh carry voiceover audio
        let args = filler_args(spacing, &filler, video, true);
        script.push_str(&format!(
            "echo \"Creating {}s spacing segment...\"\nmkdir -p spacing\n{}\n\n",
            spacing,
            command_line(&args)
        ));
    }

    let manifest = ConcatManifest::build(timeline, spacing);
    script.push_str(&format!(
        "echo \"Merging video segments...\"\ncat > {} << 'EOF'\n{}EOF\n\n",
        CONCAT_LIST_FILE,
        manifest.render()
    ));
    script.push_str(&format!(
        "mkdir -p final\n{}\n\necho \"Final video created: {}\"\n",
        command_line(&concat_args(Path::new(CONCAT_LIST_FILE), &final_path)),
        final_path.display()
    ));

    script
}
