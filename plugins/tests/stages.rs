mod common;

use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;

use common::{all_after, animation_config, arg_after, fake_engine, workspace, write, ScriptedRunner};
use talkhead_core::api::{
    roles, ErrorKind, MuxToolConfig, ResolutionMethod, StageAdapter, StageConfig, StageError,
    StageInputs, TtsToolConfig,
};
use talkhead_plugins::stage::{AnimationStage, MuxStage, TtsStage};

fn plain() -> StageConfig {
    StageConfig::new(None, 4096)
}

#[tokio::test]
async fn tts_fills_placeholders_and_resolves_expected_name() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace(dir.path()).await;
    write(&ws.input_text(), "hello".as_bytes());
    let script = dir.path().join("generate_audio.py");
    write(&script, b"");

    let runner = ScriptedRunner::new(|cmd| {
        write(&arg_after(cmd, "--output").unwrap(), b"RIFF");
        0
    });
    let cfg = TtsToolConfig {
        script: Some(script.to_string_lossy().into_owned()),
        ..TtsToolConfig::default()
    };
    let stage = TtsStage::new(runner.clone(), &cfg);

    let inputs = StageInputs::new(ws.tts_audio()).with(roles::TEXT, ws.input_text());
    let res = stage.run(&inputs, &ws, &plain()).await.unwrap();

    assert_eq!(res.resolution_method, ResolutionMethod::ExpectedName);
    assert_eq!(res.output_path, ws.tts_audio());
    let cmd = runner.last();
    assert_eq!(
        cmd.argv(),
        vec![
            script.to_string_lossy().into_owned(),
            "--text".into(),
            ws.input_text().to_string_lossy().into_owned(),
            "--output".into(),
            ws.tts_audio().to_string_lossy().into_owned(),
        ]
    );
    assert!(cmd.argv().iter().all(|a| PathBuf::from(a).is_absolute() || a.starts_with("--")));
}

#[tokio::test]
async fn tts_missing_script_is_not_installed() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace(dir.path()).await;
    write(&ws.input_text(), b"hello");

    let runner = ScriptedRunner::new(|_| 0);
    let cfg = TtsToolConfig {
        script: Some(dir.path().join("absent.py").to_string_lossy().into_owned()),
        ..TtsToolConfig::default()
    };
    let stage = TtsStage::new(runner.clone(), &cfg);

    let inputs = StageInputs::new(ws.tts_audio()).with(roles::TEXT, ws.input_text());
    let err = stage.run(&inputs, &ws, &plain()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ToolNotInstalled);
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn missing_input_fails_before_any_spawn() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace(dir.path()).await;
    let engine = fake_engine(dir.path());
    write(&ws.tts_audio(), b"RIFF");

    let runner = ScriptedRunner::new(|_| 0);
    let stage = AnimationStage::new(runner.clone(), &engine);
    let inputs = StageInputs::new(ws.animation_video())
        .with(roles::IMAGE, ws.input_image())
        .with(roles::AUDIO, ws.tts_audio());

    let err = stage
        .run(&inputs, &ws, &animation_config(&engine, "v1.5"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputMissing);
    assert!(runner.calls().is_empty());
}

fn animation_inputs(ws: &talkhead_core::api::Workspace) -> StageInputs {
    write(&ws.input_image(), b"jpeg");
    write(&ws.tts_audio(), b"RIFF");
    StageInputs::new(ws.animation_video())
        .with(roles::IMAGE, ws.input_image())
        .with(roles::AUDIO, ws.tts_audio())
}

#[tokio::test]
async fn animation_builds_engine_arguments_and_takes_canonical_result() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace(dir.path()).await;
    let engine = fake_engine(dir.path());
    let inputs = animation_inputs(&ws);

    let runner = ScriptedRunner::new(|cmd| {
        let result_dir = arg_after(cmd, "--result_dir").unwrap();
        write(&result_dir.join("result.mp4"), b"video");
        0
    });
    let stage = AnimationStage::new(runner.clone(), &engine);
    let res = stage
        .run(&inputs, &ws, &animation_config(&engine, "v1.5"))
        .await
        .unwrap();

    assert_eq!(res.resolution_method, ResolutionMethod::ExpectedName);
    assert_eq!(fs::read(ws.animation_video()).unwrap(), b"video");
    assert!(!ws.animation_result_dir().exists());

    let cmd = runner.last();
    let argv = cmd.argv();
    assert_eq!(cmd.program, "python");
    assert!(argv[0].ends_with("app.py"));
    assert_eq!(&argv[1..3], &["--inference".to_string(), "--cpu_only".to_string()]);
    assert_eq!(arg_after(&cmd, "--source_image").unwrap(), ws.input_image());
    assert_eq!(arg_after(&cmd, "--driven_audio").unwrap(), ws.tts_audio());
    assert_eq!(arg_after(&cmd, "--version").unwrap(), PathBuf::from("v15"));
    assert!(arg_after(&cmd, "--unet_model_path")
        .unwrap()
        .ends_with("models/musetalkV15/unet.pth"));
    assert_eq!(arg_after(&cmd, "--fps").unwrap(), PathBuf::from("25"));
    assert_eq!(arg_after(&cmd, "--bbox_shift").unwrap(), PathBuf::from("0"));
    assert!(argv.contains(&"--use_float16".to_string()));
}

#[tokio::test]
async fn animation_falls_back_to_scanned_video() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace(dir.path()).await;
    let engine = fake_engine(dir.path());
    let inputs = animation_inputs(&ws);

    let runner = ScriptedRunner::new(|cmd| {
        let result_dir = arg_after(cmd, "--result_dir").unwrap();
        write(&result_dir.join("v15/other_name.mp4"), b"fallback");
        0
    });
    let stage = AnimationStage::new(runner, &engine);
    let res = stage
        .run(&inputs, &ws, &animation_config(&engine, "v1.5"))
        .await
        .unwrap();

    assert_eq!(res.resolution_method, ResolutionMethod::FallbackScan);
    assert_eq!(fs::read(ws.animation_video()).unwrap(), b"fallback");
    assert!(!ws.animation_result_dir().exists());
}

#[tokio::test]
async fn animation_without_video_is_output_missing() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace(dir.path()).await;
    let engine = fake_engine(dir.path());
    let inputs = animation_inputs(&ws);

    let runner = ScriptedRunner::new(|cmd| {
        let result_dir = arg_after(cmd, "--result_dir").unwrap();
        write(&result_dir.join("frames/0001.png"), b"png");
        0
    });
    let stage = AnimationStage::new(runner, &engine);
    let err = stage
        .run(&inputs, &ws, &animation_config(&engine, "v1.0"))
        .await
        .unwrap_err();

    match err {
        StageError::OutputMissing { listing, .. } => {
            assert_eq!(listing, vec!["frames/".to_string(), "frames/0001.png".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!ws.animation_video().exists());
    assert!(!ws.animation_result_dir().exists());
}

#[tokio::test]
async fn nonzero_exit_fails_even_with_output_present() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace(dir.path()).await;
    let engine = fake_engine(dir.path());
    let inputs = animation_inputs(&ws);

    let runner = ScriptedRunner::new(|cmd| {
        let result_dir = arg_after(cmd, "--result_dir").unwrap();
        write(&result_dir.join("result.mp4"), b"stale");
        1
    });
    let stage = AnimationStage::new(runner, &engine);
    let err = stage
        .run(&inputs, &ws, &animation_config(&engine, "v1.5"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvocationFailed);
    assert!(err.to_string().contains("scripted failure"));
    assert!(!ws.animation_video().exists());
    assert!(!ws.animation_result_dir().exists());
}

#[tokio::test]
async fn animation_missing_weights_is_not_installed() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace(dir.path()).await;
    let engine = fake_engine(dir.path());
    fs::remove_file(
        PathBuf::from(&engine.engine_dir).join("models/musetalkV15/unet.pth"),
    )
    .unwrap();
    let inputs = animation_inputs(&ws);

    let runner = ScriptedRunner::new(|_| 0);
    let stage = AnimationStage::new(runner.clone(), &engine);
    let err = stage
        .run(&inputs, &ws, &animation_config(&engine, "v1.5"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ToolNotInstalled);
    assert!(err.to_string().contains("unet.pth"));
    assert!(runner.calls().is_empty());
}

/// Fake ffmpeg over files holding `duration=<secs>`: honors `-shortest`.
fn fake_ffmpeg(cmd: &talkhead_core::api::ToolCommand) -> i32 {
    let duration = |p: &PathBuf| -> u32 {
        let body = fs::read_to_string(p).unwrap();
        body.trim().trim_start_matches("duration=").parse().unwrap()
    };
    let inputs: Vec<u32> = all_after(cmd, "-i").iter().map(duration).collect();
    let argv = cmd.argv();
    let out = duration_output(&inputs, argv.contains(&"-shortest".to_string()));
    write(
        &PathBuf::from(argv.last().unwrap()),
        format!("duration={out}").as_bytes(),
    );
    0
}

fn duration_output(inputs: &[u32], shortest: bool) -> u32 {
    if shortest {
        inputs.iter().copied().min().unwrap_or(0)
    } else {
        inputs.iter().copied().max().unwrap_or(0)
    }
}

#[tokio::test]
async fn mux_output_is_as_long_as_the_shorter_input() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace(dir.path()).await;
    write(&ws.animation_video(), b"duration=10");
    write(&ws.tts_audio(), b"duration=7");

    let runner = ScriptedRunner::new(fake_ffmpeg);
    let stage = MuxStage::new(runner.clone(), &MuxToolConfig::default());
    let inputs = StageInputs::new(ws.final_video())
        .with(roles::VIDEO, ws.animation_video())
        .with(roles::AUDIO, ws.tts_audio());

    let res = stage.run(&inputs, &ws, &plain()).await.unwrap();
    assert_eq!(res.output_path, ws.final_video());
    assert_eq!(fs::read_to_string(ws.final_video()).unwrap(), "duration=7");
    assert!(!ws.path().join("final.tmp.mp4").exists());

    let cmd = runner.last();
    assert_eq!(cmd.program, "ffmpeg");
    assert_eq!(all_after(&cmd, "-i"), vec![ws.animation_video(), ws.tts_audio()]);
    assert_eq!(arg_after(&cmd, "-c:v").unwrap(), PathBuf::from("copy"));
    assert_eq!(arg_after(&cmd, "-c:a").unwrap(), PathBuf::from("aac"));
    assert!(cmd.argv().contains(&"-shortest".to_string()));
    assert_eq!(cmd.argv()[0], "-y");
}

#[tokio::test]
async fn failed_mux_leaves_no_final_file() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace(dir.path()).await;
    write(&ws.animation_video(), b"duration=10");
    write(&ws.tts_audio(), b"duration=7");

    let runner = ScriptedRunner::new(|cmd| {
        write(&PathBuf::from(cmd.argv().last().unwrap()), b"partial");
        1
    });
    let stage = MuxStage::new(runner, &MuxToolConfig::default());
    let inputs = StageInputs::new(ws.final_video())
        .with(roles::VIDEO, ws.animation_video())
        .with(roles::AUDIO, ws.tts_audio());

    let err = stage.run(&inputs, &ws, &plain()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvocationFailed);
    assert!(!ws.final_video().exists());
    assert!(!ws.path().join("final.tmp.mp4").exists());
}
