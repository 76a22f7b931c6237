//! End-to-end scene tests against scripted replies
//!
//! Every test drives a scheduler by hand and checks the turn serialization
//! invariant after every single input.

use std::sync::Arc;

use hearth_core::prelude::*;
use hearth_core::outcome::read_registry;

fn gate_script() -> SceneScript {
    SceneScript::new("Gate")
        .with_next_scene("Square")
        .with_scene_prompt("Dusk. A stranger stands at the village gate.")
        .with_cast_member(
            CastMember::new("brown")
                .with_display_name("Brown")
                .with_color(Color::rgb(192, 57, 43))
                .with_persona("Act as a rude, suspicious gatekeeper."),
        )
        .with_cast_member(
            CastMember::new("toma")
                .with_display_name("Toma")
                .with_persona("Act as a curious young guard."),
        )
        .with_step(ScriptStep::npc("brown", "Stop the stranger and demand a name."))
        .with_step(ScriptStep::npc("toma", "Add something friendly."))
        .with_step(ScriptStep::player("brown"))
        .with_step(ScriptStep::evaluation(
            "brown",
            "The stranger answered: \"{player}\". React.",
            EvaluationSlot::First,
        ))
        .with_step(ScriptStep::npc("toma", "Ask the stranger why they came."))
        .with_step(ScriptStep::player("toma"))
        .with_step(ScriptStep::evaluation(
            "toma",
            "The stranger answered: \"{player}\". React.",
            EvaluationSlot::Second,
        ))
}

fn gate_replies(first: &str, second: &str) -> Vec<ScriptedReply> {
    vec![
        ScriptedReply::judgment("Halt! Name yourself.", "angry", "unfavorable"),
        ScriptedReply::judgment("Don't mind him.", "happy", "favorable"),
        ScriptedReply::judgment("Hmph.", "neutral", first),
        ScriptedReply::judgment("Why are you here?", "surprised", "favorable"),
        ScriptedReply::judgment("I see.", "neutral", second),
    ]
}

fn build(
    script: SceneScript,
    provider: Arc<dyn LLMProvider>,
    panel: TextPanel,
) -> TurnScheduler<TextPanel> {
    let cast = Cast::from_members(&script.cast, provider, &HearthConfig::default())
        .expect("cast builds");
    TurnScheduler::new(script, cast, panel, OutcomeRegistry::new().into_shared())
}

/// Play a scene to the end, answering with `answers` in order
async fn drive(
    scheduler: &mut TurnScheduler<TextPanel>,
    replies: &mut ReplyReceiver,
    answers: &[&str],
) -> SceneReport {
    let mut answers = answers.iter();

    loop {
        assert!(
            scheduler.state().invariant_holds(),
            "invariant broken in {:?}",
            scheduler.state()
        );

        let outcome = match scheduler.turn_status() {
            TurnStatus::InFlight => {
                let reply = replies.recv().await.expect("reply arrives");
                scheduler.handle_reply(&reply);
                AdvanceOutcome::Ignored
            }
            TurnStatus::WaitingForPlayer => {
                let answer = answers.next().expect("script asks for more answers");
                scheduler.submit_player_text(answer)
            }
            TurnStatus::Pending | TurnStatus::TurnComplete => scheduler.advance(),
            status => panic!("unexpected status {status:?}"),
        };

        if let AdvanceOutcome::Finished(report) = outcome {
            assert!(scheduler.state().invariant_holds());
            assert_eq!(answers.next(), None, "unused answers");
            return report;
        }
    }
}

#[tokio::test]
async fn test_gate_outcomes() {
    let cases = [
        ("favorable", "favorable", SceneOutcome::BothFavorable, 2, 0),
        ("favorable", "unfavorable", SceneOutcome::Mixed, 1, 1),
        ("unfavorable", "unfavorable", SceneOutcome::BothUnfavorable, 0, 2),
    ];

    for (first, second, expected, like, dislike) in cases {
        let provider = Arc::new(ScriptedProvider::new(gate_replies(first, second)));
        let mut scheduler = build(gate_script(), provider, TextPanel::typewriter());
        let (tx, mut rx) = reply_channel();
        scheduler.start(tx);

        let report = drive(
            &mut scheduler,
            &mut rx,
            &["I'm a traveling cook.", "I heard you need help with the harvest."],
        )
        .await;

        let record = report.record.expect("gate records an outcome");
        assert_eq!(record.outcome, expected, "{first}/{second}");
        assert_eq!(record.like_count, like);
        assert_eq!(record.dislike_count, dislike);
        assert_eq!(record.first_evaluation, Some(Sentiment::normalize(first)));
        assert_eq!(record.second_evaluation, Some(Sentiment::normalize(second)));
        assert_eq!(report.next_scene.as_deref(), Some("Square"));
    }
}

#[tokio::test]
async fn test_player_lines_reach_every_npc_before_the_next_prompt() {
    let provider = Arc::new(ScriptedProvider::new(gate_replies("favorable", "favorable")));
    let mut scheduler = build(gate_script(), provider.clone(), TextPanel::new());
    let (tx, mut rx) = reply_channel();
    scheduler.start(tx);

    let report = drive(&mut scheduler, &mut rx, &["Mira, a cook.", "To help."]).await;

    let lines: Vec<_> = report
        .log
        .entries()
        .iter()
        .map(|e| format!("{}: {}", e.speaker, e.text))
        .collect();
    assert_eq!(
        lines,
        vec![
            "Brown: Halt! Name yourself.",
            "Toma: Don't mind him.",
            "Player: Mira, a cook.",
            "Brown: Hmph.",
            "Toma: Why are you here?",
            "Player: To help.",
            "Toma: I see.",
        ]
    );

    // third call is Brown's evaluation: the answer was heard first, then prompted
    let history = provider.call_history().await;
    assert_eq!(history.len(), 5);
    let brown_eval = &history[2];
    let n = brown_eval.len();
    assert_eq!(brown_eval[n - 2].content, "Player: Mira, a cook.");
    assert!(brown_eval[n - 1]
        .content
        .starts_with("The stranger answered: \"Mira, a cook.\". React."));

    // Toma heard Brown's reply to the player
    let toma = scheduler.cast().get("toma").expect("toma");
    assert!(toma
        .transcript()
        .messages()
        .iter()
        .any(|m| m.content == "Brown: Hmph."));
}

#[tokio::test]
async fn test_scene_prompt_seeds_every_agent() {
    let provider = Arc::new(ScriptedProvider::new(gate_replies("favorable", "favorable")));
    let mut scheduler = build(gate_script(), provider.clone(), TextPanel::new());
    let (tx, mut rx) = reply_channel();
    scheduler.start(tx);
    drive(&mut scheduler, &mut rx, &["a", "b"]).await;

    for transcript in provider.call_history().await {
        assert_eq!(transcript[0].role, MessageRole::System);
        assert!(transcript[0].content.starts_with("Act as a"));
        assert_eq!(transcript[1].role, MessageRole::System);
        assert_eq!(
            transcript[1].content,
            "Dusk. A stranger stands at the village gate."
        );
    }
}

#[tokio::test]
async fn test_evaluation_slot_fills_once() {
    // two turns bound to the same slot; validation would reject this script,
    // the scheduler must still count the slot once
    let script = SceneScript::new("Echo")
        .with_cast_member(CastMember::new("brown"))
        .with_step(ScriptStep::player("brown"))
        .with_step(ScriptStep::evaluation("brown", "{player}", EvaluationSlot::First))
        .with_step(ScriptStep::evaluation("brown", "{player}", EvaluationSlot::First))
        .with_step(ScriptStep::evaluation("brown", "{player}", EvaluationSlot::First));
    assert!(script.validate().is_err());

    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptedReply::judgment("Good.", "happy", "favorable"),
        ScriptedReply::judgment("Bad.", "angry", "unfavorable"),
        ScriptedReply::judgment("Bad.", "angry", "unfavorable"),
    ]));
    let mut scheduler = build(script, provider, TextPanel::new());
    let (tx, mut rx) = reply_channel();
    scheduler.start(tx);

    let report = drive(&mut scheduler, &mut rx, &["Hello."]).await;
    let record = report.record.expect("record");
    assert_eq!(record.like_count, 1);
    assert_eq!(record.dislike_count, 0);
    assert_eq!(record.first_evaluation, Some(Sentiment::Favorable));
    assert_eq!(scheduler.state().evaluation_target, None);
}

#[tokio::test]
async fn test_trial_shares_three_answers_without_recording() {
    let mut script = SceneScript::new("Trial")
        .with_cast_member(CastMember::new("judge").with_display_name("Judge"))
        .with_cast_member(CastMember::new("elder").with_display_name("Elder"))
        .with_cast_member(CastMember::new("smith").with_display_name("Smith"))
        .with_step(ScriptStep::npc("judge", "Open the trial."))
        .with_step(ScriptStep::player("judge"))
        .with_step(ScriptStep::npc("elder", "Respond to: {player}"))
        .with_step(ScriptStep::player("elder"))
        .with_step(ScriptStep::npc("smith", "Respond to: {player}"))
        .with_step(ScriptStep::player("smith"))
        .with_step(ScriptStep::npc("judge", "Deliver the verdict after: {player}"));
    script.record_outcome = false;
    script.validate().expect("valid trial");

    let provider = Arc::new(ScriptedProvider::repeating(ScriptedReply::judgment(
        "Noted.", "neutral", "unfavorable",
    )));
    let mut scheduler = build(script, provider.clone(), TextPanel::new());
    let registry = Arc::clone(scheduler.registry());
    let (tx, mut rx) = reply_channel();
    scheduler.start(tx);

    let answers = ["I did not steal.", "I was at the mill.", "Ask the miller."];
    let report = drive(&mut scheduler, &mut rx, &answers).await;

    assert!(report.record.is_none());
    assert_eq!(read_registry(&registry).saved_scene_count(), 0);
    assert_eq!(provider.call_count(), 4);

    for agent in scheduler.cast().iter() {
        let heard = agent
            .transcript()
            .messages()
            .iter()
            .filter(|m| m.content.starts_with("Player: "))
            .count();
        assert_eq!(heard, 3, "{} missed a player line", agent.id());
    }
}

#[tokio::test]
async fn test_private_answer_reaches_only_the_target() {
    let mut script = gate_script();
    script.broadcast_player_lines = false;

    let provider = Arc::new(ScriptedProvider::new(gate_replies("favorable", "favorable")));
    let mut scheduler = build(script, provider, TextPanel::new());
    let (tx, mut rx) = reply_channel();
    scheduler.start(tx);
    drive(&mut scheduler, &mut rx, &["For Brown only.", "For Toma only."]).await;

    let heard = |id: &str| -> Vec<String> {
        scheduler
            .cast()
            .get(id)
            .expect("agent")
            .transcript()
            .messages()
            .iter()
            .filter(|m| m.content.starts_with("Player: "))
            .map(|m| m.content.clone())
            .collect()
    };
    assert_eq!(heard("brown"), vec!["Player: For Brown only."]);
    assert_eq!(heard("toma"), vec!["Player: For Toma only."]);
}

#[tokio::test]
async fn test_garbled_and_empty_replies_keep_the_scene_moving() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptedReply::text("Sure! Here you go: ```json\n{\"message\":\"Halt.\",\"emotion\":\"mad\",\"affinity_change\":-1}\n```"),
        ScriptedReply::Empty,
        ScriptedReply::text("\"You seem honest.\""),
        ScriptedReply::Failure("upstream timeout".to_string()),
        ScriptedReply::text("{\"message\":\"Welcome.\",\"emotion\":\"happy\",\"affinity_change\":+2}"),
    ]));
    let mut scheduler = build(gate_script(), provider, TextPanel::new());
    let (tx, mut rx) = reply_channel();
    scheduler.start(tx);

    let report = drive(&mut scheduler, &mut rx, &["Hello.", "Work."]).await;
    let record = report.record.expect("record");
    // unquoted prose falls back to unfavorable, +2 is favorable
    assert_eq!(record.first_evaluation, Some(Sentiment::Unfavorable));
    assert_eq!(record.second_evaluation, Some(Sentiment::Favorable));
    assert_eq!(record.outcome, SceneOutcome::Mixed);

    let texts: Vec<_> = report.log.entries().iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts[0], "Halt.");
    assert_eq!(texts[1], "...");
    assert_eq!(texts[3], "You seem honest.");
    assert_eq!(texts[4], "...");
    assert_eq!(texts[6], "Welcome.");
}

#[tokio::test]
async fn test_late_reply_after_finish_is_discarded() {
    let script = SceneScript::new("Short")
        .with_cast_member(CastMember::new("brown"))
        .with_cast_member(CastMember::new("toma"))
        .with_step(ScriptStep::npc("brown", "Say goodbye."));

    let provider = Arc::new(ScriptedProvider::repeating(ScriptedReply::judgment(
        "Bye.", "sad", "unfavorable",
    )));
    let mut scheduler = build(script, provider, TextPanel::new());
    let (tx, mut rx) = reply_channel();
    scheduler.start(tx);

    // toma asks on the side; its reply only lands after the scene is over
    assert!(scheduler.cast_mut().get_mut("toma").expect("toma").ask("psst"));

    let mut pending = Vec::new();
    while scheduler.turn_status() == TurnStatus::InFlight {
        let reply = rx.recv().await.expect("reply");
        if reply.agent_id == "toma" {
            pending.push(reply);
        } else {
            scheduler.handle_reply(&reply);
        }
    }
    if pending.is_empty() {
        pending.push(rx.recv().await.expect("toma reply"));
    }

    assert!(scheduler.advance().is_finished());
    let log_len = scheduler.state().log.len();

    for reply in &pending {
        assert!(scheduler.handle_reply(reply).is_none());
    }
    assert_eq!(scheduler.state().log.len(), log_len);
    assert!(scheduler.cast().iter().all(|a| !a.is_subscribed()));
}
