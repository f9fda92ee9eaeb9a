//! Orchestrator behavior against an in-memory engine.

mod support;

use std::sync::Arc;

use tokio::sync::watch;
use vforge_assembly::{
    Assembler, AssemblyConfig, AssemblyError, AssemblyInput, AssetResolver, NarrationInput,
    ResolvedScene,
};
use vforge_models::{
    AssemblyStage, ClipAsset, ImageAsset, MotionEffect, Orientation, ResolvedAsset, Scene,
    VisualMode,
};

use support::{recording_sink, EchoFetcher, FakeEngine, PromptImages, QuerySearch, NARRATION_MARKER};

fn clip_scene(number: u32, seconds: f64, uri: &str) -> ResolvedScene {
    ResolvedScene {
        scene: Scene::new(number, seconds, format!("narration {number}"), "intent"),
        asset: ResolvedAsset::Clip(ClipAsset::fitted(uri, Some(uri.to_string()), 12.0, seconds)),
    }
}

fn narration() -> NarrationInput {
    NarrationInput::new(b"ID3-fake-audio".to_vec(), "mp3")
}

fn assembler(engine: FakeEngine) -> Assembler<FakeEngine> {
    Assembler::new(engine, AssemblyConfig::default()).with_fetcher(Arc::new(EchoFetcher::default()))
}

#[tokio::test]
async fn test_segments_follow_scene_number_order() {
    let engine = FakeEngine::new(45.0);
    let handle = engine.clone();
    let (sink, seen) = recording_sink();

    let input = AssemblyInput::Resolved(vec![
        clip_scene(3, 10.0, "clip://blue"),
        clip_scene(1, 10.0, "clip://red"),
        clip_scene(2, 10.0, "clip://green"),
    ]);

    let output = assembler(engine)
        .with_progress(sink)
        .assemble(input, narration(), VisualMode::StockClip, Orientation::Landscape)
        .await
        .unwrap();

    let expected = [
        b"[clip://red][clip://green][clip://blue]".as_slice(),
        NARRATION_MARKER,
    ]
    .concat();
    assert_eq!(output.bytes, expected);
    assert_eq!(output.content_type, "video/mp4");
    assert_eq!(output.duration_seconds, 30.0);

    let progress: Vec<(AssemblyStage, u8)> = seen
        .lock()
        .unwrap()
        .iter()
        .map(|p| (p.stage, p.progress))
        .collect();
    assert_eq!(
        progress,
        vec![
            (AssemblyStage::Init, 0),
            (AssemblyStage::Process, 10),
            (AssemblyStage::Process, 30),
            (AssemblyStage::Process, 50),
            (AssemblyStage::Merge, 70),
            (AssemblyStage::Audio, 85),
            (AssemblyStage::Export, 95),
            (AssemblyStage::Done, 100),
        ]
    );

    // Only the final output remains in the workspace
    let state = handle.state();
    let mut files: Vec<_> = state.files.keys().cloned().collect();
    files.sort();
    assert_eq!(files, vec!["final.mp4"]);
}

#[tokio::test]
async fn test_output_is_bounded_by_audio() {
    let engine = FakeEngine::new(45.0);
    let input = AssemblyInput::Resolved(
        (1..=5)
            .map(|n| clip_scene(n, if n == 5 { 9.2 } else { 12.0 }, &format!("clip://{n}")))
            .collect(),
    );

    let output = assembler(engine)
        .assemble(input, narration(), VisualMode::StockClip, Orientation::Landscape)
        .await
        .unwrap();

    assert_eq!(output.duration_seconds, 45.0);
}

#[tokio::test]
async fn test_unresolved_scenes_are_resolved_first() {
    let engine = FakeEngine::new(20.0);
    let handle = engine.clone();
    let (sink, seen) = recording_sink();
    let fetcher = Arc::new(EchoFetcher::default());

    let resolver = AssetResolver::new(&AssemblyConfig::default()).with_video_search(Arc::new(QuerySearch));
    let scenes = vec![
        Scene::new(1, 10.0, "", "ocean waves"),
        Scene::new(2, 10.0, "", "city night"),
    ];

    let output = Assembler::new(engine, AssemblyConfig::default())
        .with_resolver(resolver)
        .with_fetcher(fetcher.clone())
        .with_progress(sink)
        .assemble(
            AssemblyInput::Scenes(scenes),
            narration(),
            VisualMode::StockClip,
            Orientation::Landscape,
        )
        .await
        .unwrap();

    assert_eq!(
        *fetcher.fetched.lock().unwrap(),
        vec!["stock://ocean-waves", "stock://city-night"]
    );
    assert!(output.bytes.starts_with(b"[stock://ocean-waves][stock://city-night]"));

    let stages: Vec<_> = seen.lock().unwrap().iter().map(|p| p.stage).collect();
    assert_eq!(stages[1], AssemblyStage::Download);

    // 6 s footage looped into 10 s scenes
    let state = handle.state();
    let first = &state.commands[0];
    let loop_at = first.iter().position(|a| a == "-stream_loop").unwrap();
    assert_eq!(first[loop_at + 1], "1");
}

#[tokio::test]
async fn test_image_scenes_render_with_motion() {
    let engine = FakeEngine::new(12.0);
    let handle = engine.clone();
    let input = AssemblyInput::Resolved(vec![ResolvedScene {
        scene: Scene::new(1, 12.0, "", "forest"),
        asset: ResolvedAsset::Image(ImageAsset {
            source_uri: "image://forest".to_string(),
            motion_effect: MotionEffect::PanLeft,
        }),
    }]);

    assembler(engine)
        .assemble(input, narration(), VisualMode::AiImage, Orientation::Portrait)
        .await
        .unwrap();

    let state = handle.state();
    let args = &state.commands[0];
    assert!(args.iter().any(|a| a == "-loop"));
    assert!(args.iter().any(|a| a.contains("zoompan")));
}

#[tokio::test]
async fn test_cancel_before_start() {
    let engine = FakeEngine::new(30.0);
    let handle = engine.clone();
    let (tx, rx) = watch::channel(true);

    let err = assembler(engine)
        .with_cancel(rx)
        .assemble(
            AssemblyInput::Resolved(vec![clip_scene(1, 10.0, "clip://a")]),
            narration(),
            VisualMode::StockClip,
            Orientation::Landscape,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AssemblyError::Cancelled));
    assert!(handle.state().commands.is_empty());
    drop(tx);
}

#[tokio::test]
async fn test_cancel_between_scenes() {
    let (tx, rx) = watch::channel(false);
    let engine = FakeEngine::new(30.0).cancel_after(1, tx);
    let handle = engine.clone();
    let (sink, seen) = recording_sink();

    let err = assembler(engine)
        .with_cancel(rx)
        .with_progress(sink)
        .assemble(
            AssemblyInput::Resolved(vec![
                clip_scene(1, 10.0, "clip://a"),
                clip_scene(2, 10.0, "clip://b"),
                clip_scene(3, 10.0, "clip://c"),
            ]),
            narration(),
            VisualMode::StockClip,
            Orientation::Landscape,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AssemblyError::Cancelled));
    assert_eq!(handle.state().segment_commands(), 1);
    let last = seen.lock().unwrap().last().map(|p| p.progress).unwrap();
    assert!(last < 70);
}

#[tokio::test]
async fn test_render_failure_names_the_scene() {
    let engine = FakeEngine::new(30.0).fail_exec_at(1);

    let err = assembler(engine)
        .assemble(
            AssemblyInput::Resolved(vec![
                clip_scene(1, 10.0, "clip://a"),
                clip_scene(2, 10.0, "clip://b"),
                clip_scene(3, 10.0, "clip://c"),
            ]),
            narration(),
            VisualMode::StockClip,
            Orientation::Landscape,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AssemblyError::SceneRender { scene_number: 2, .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_concat_and_mux_failures_are_typed() {
    // Three segments render (execs 0-2), then concat is exec 3 and mux exec 4
    let scenes = || {
        AssemblyInput::Resolved(vec![
            clip_scene(1, 10.0, "clip://a"),
            clip_scene(2, 10.0, "clip://b"),
            clip_scene(3, 10.0, "clip://c"),
        ])
    };

    let err = assembler(FakeEngine::new(30.0).fail_exec_at(3))
        .assemble(scenes(), narration(), VisualMode::StockClip, Orientation::Landscape)
        .await
        .unwrap_err();
    assert!(matches!(err, AssemblyError::Concatenation(_)));

    let err = assembler(FakeEngine::new(30.0).fail_exec_at(4))
        .assemble(scenes(), narration(), VisualMode::StockClip, Orientation::Landscape)
        .await
        .unwrap_err();
    assert!(matches!(err, AssemblyError::Mux(_)));
}

#[tokio::test]
async fn test_fetch_failure_aborts_run() {
    let fetcher = EchoFetcher {
        failing_uri: Some("clip://b".to_string()),
        ..Default::default()
    };
    let engine = FakeEngine::new(30.0);
    let handle = engine.clone();

    let err = Assembler::new(engine, AssemblyConfig::default())
        .with_fetcher(Arc::new(fetcher))
        .assemble(
            AssemblyInput::Resolved(vec![
                clip_scene(1, 10.0, "clip://a"),
                clip_scene(2, 10.0, "clip://b"),
            ]),
            narration(),
            VisualMode::StockClip,
            Orientation::Landscape,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AssemblyError::AssetResolution { scene_number: 2, .. }));
    assert!(err.is_retryable());
    assert!(!handle.state().files.contains_key("final.mp4"));
}

#[tokio::test]
async fn test_invalid_inputs() {
    let err = assembler(FakeEngine::new(30.0))
        .assemble(
            AssemblyInput::Scenes(Vec::new()),
            narration(),
            VisualMode::StockClip,
            Orientation::Landscape,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AssemblyError::ScriptEmpty));

    let err = assembler(FakeEngine::new(30.0))
        .assemble(
            AssemblyInput::Scenes(vec![Scene::new(1, 10.0, "text", "intent")]),
            narration(),
            VisualMode::StockClip,
            Orientation::Landscape,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AssemblyError::Config(_)));

    let err = assembler(FakeEngine::new(30.0))
        .assemble(
            AssemblyInput::Resolved(vec![clip_scene(1, -3.0, "clip://a")]),
            narration(),
            VisualMode::StockClip,
            Orientation::Landscape,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AssemblyError::Config(_)));
}

#[tokio::test]
async fn test_assemble_script_probes_narration() {
    let engine = FakeEngine::new(30.0);
    let handle = engine.clone();
    let resolver = AssetResolver::new(&AssemblyConfig::default())
        .with_image_generator(Arc::new(PromptImages));

    let script = "The sun rises over quiet hills. Birds start to sing. \
                  A river winds through the valley. Night falls again.";
    let output = assembler(engine)
        .with_resolver(resolver)
        .assemble_script(script, narration(), VisualMode::AiImage, Orientation::Landscape)
        .await
        .unwrap();

    // ceil(30 / 8) = 4 generated scenes covering the narration
    assert_eq!(handle.state().segment_commands(), 4);
    assert_eq!(output.duration_seconds, 30.0);
}

#[tokio::test]
async fn test_assemble_script_estimates_when_probe_fails() {
    let engine = FakeEngine::new(60.0).fail_probe();
    let handle = engine.clone();
    let resolver = AssetResolver::new(&AssemblyConfig::default()).with_video_search(Arc::new(QuerySearch));

    // 150 words at 150 wpm is 60 s, so five 12 s stock scenes
    let script = (0..150).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ");
    assembler(engine)
        .with_resolver(resolver)
        .assemble_script(&script, narration(), VisualMode::StockClip, Orientation::Landscape)
        .await
        .unwrap();

    assert_eq!(handle.state().segment_commands(), 5);
}
