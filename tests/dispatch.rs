//! Integration tests for line dispatch: parsing, permissions, replies.

mod common;

use std::sync::Arc;

use botcmd::command::{
    CommandScope, CommandSpec, MentionSetting, ParameterSpec, ReplyTarget, Returns, reply, value,
};
use botcmd::convert::{Converted, Reply, TypeTag, Value};
use botcmd::error::{ConvertError, DefinitionError};
use botcmd::transport::Scope;
use botcmd::{Dispatch, IgnoreReason};
use botcmd_proto::Restriction;
use common::{RecordingTransport, TestMessage, dispatcher, dispatcher_with};
use parking_lot::Mutex;

type Calls = Arc<Mutex<Vec<Vec<Value>>>>;

/// `convert(int, int)` that records its arguments.
fn convert_command(calls: &Calls, usage: &str) -> CommandSpec {
    let calls = Arc::clone(calls);
    CommandSpec::builder("convert")
        .usage(usage)
        .param(ParameterSpec::new(TypeTag::INT))
        .param(ParameterSpec::new(TypeTag::INT))
        .handler(move |inv| {
            calls.lock().push(inv.args().iter().cloned().collect());
            Ok(None)
        })
}

#[test]
fn test_converts_and_invokes_with_arguments() {
    let (dispatcher, transport) = dispatcher();
    let calls = Calls::default();
    dispatcher.register_command(convert_command(&calls, "convert <a> <b>")).unwrap();

    let outcome = dispatcher.handle(&TestMessage::shared("!convert 5 10")).unwrap();
    assert_eq!(outcome, Dispatch::Completed);
    assert_eq!(*calls.lock(), vec![vec![Value::Int(5), Value::Int(10)]]);
    assert!(transport.is_silent());
}

#[test]
fn test_missing_parameter_emits_usage() {
    let (dispatcher, transport) = dispatcher();
    let calls = Calls::default();
    dispatcher.register_command(convert_command(&calls, "convert <a> <b>")).unwrap();

    let outcome = dispatcher.handle(&TestMessage::shared("!convert 5")).unwrap();
    assert_eq!(outcome, Dispatch::Usage);
    assert_eq!(transport.texts(), vec!["Usage: convert <a> <b>"]);
    assert!(calls.lock().is_empty());
}

#[test]
fn test_missing_parameter_without_usage_string() {
    let (dispatcher, transport) = dispatcher();
    let calls = Calls::default();
    dispatcher.register_command(convert_command(&calls, "")).unwrap();

    dispatcher.handle(&TestMessage::shared("!convert")).unwrap();
    assert_eq!(
        transport.texts(),
        vec!["Not enough parameters (no usage string provided)"]
    );
    assert!(calls.lock().is_empty());
}

#[test]
fn test_text_without_prefix_is_ignored() {
    let (dispatcher, transport) = dispatcher();
    let calls = Calls::default();
    dispatcher.register_command(convert_command(&calls, "")).unwrap();

    for line in ["convert 5 10", "", "   ", "hello !convert 5 10"] {
        let outcome = dispatcher.handle(&TestMessage::shared(line)).unwrap();
        assert_eq!(outcome, Dispatch::Ignored(IgnoreReason::NoPrefix));
    }
    assert_eq!(
        dispatcher.handle(&TestMessage::shared("!")).unwrap(),
        Dispatch::Ignored(IgnoreReason::Empty)
    );
    assert_eq!(
        dispatcher.handle(&TestMessage::shared("!nothing 1")).unwrap(),
        Dispatch::Ignored(IgnoreReason::UnknownCommand)
    );
    assert!(transport.is_silent());
    assert!(calls.lock().is_empty());
}

#[test]
fn test_command_names_ignore_case_and_surrounding_space() {
    let (dispatcher, _transport) = dispatcher();
    let calls = Calls::default();
    dispatcher.register_command(convert_command(&calls, "")).unwrap();

    dispatcher.handle(&TestMessage::shared("   !CONVERT 1 2  ")).unwrap();
    assert_eq!(calls.lock().len(), 1);
}

#[test]
fn test_capability_denial_never_invokes() {
    let (dispatcher, transport) = dispatcher();
    let calls = Calls::default();
    let gated = {
        let calls = Arc::clone(&calls);
        CommandSpec::builder("ban")
            .capability("moderate")
            .param(ParameterSpec::new(TypeTag::STRING))
            .handler(move |inv| {
                calls.lock().push(inv.args().iter().cloned().collect());
                Ok(None)
            })
    };
    dispatcher.register_command(gated).unwrap();

    let outcome = dispatcher.handle(&TestMessage::shared("!ban mallory")).unwrap();
    assert_eq!(outcome, Dispatch::Denied);
    assert_eq!(
        transport.texts(),
        vec!["You can't use this command because you don't have the moderate permission."]
    );
    assert!(calls.lock().is_empty());
}

#[test]
fn test_capability_granted_invokes() {
    let (dispatcher, _transport) =
        dispatcher_with(RecordingTransport::with_capabilities(&["moderate"]));
    let calls = Calls::default();
    let gated = {
        let calls = Arc::clone(&calls);
        CommandSpec::builder("ban")
            .capability("moderate")
            .param(ParameterSpec::new(TypeTag::STRING))
            .handler(move |inv| {
                calls.lock().push(inv.args().iter().cloned().collect());
                Ok(None)
            })
    };
    dispatcher.register_command(gated).unwrap();

    dispatcher.handle(&TestMessage::shared("!ban mallory")).unwrap();
    assert_eq!(*calls.lock(), vec![vec![Value::Text("mallory".into())]]);
}

#[test]
fn test_invalid_parameter_reports_position() {
    let (dispatcher, transport) = dispatcher();
    let calls = Calls::default();
    dispatcher.register_command(convert_command(&calls, "convert <a> <b>")).unwrap();

    let outcome = dispatcher.handle(&TestMessage::shared("!convert 5 ten")).unwrap();
    assert_eq!(outcome, Dispatch::InvalidParameter { index: 2 });
    assert_eq!(
        transport.texts(),
        vec!["Parameter 2 is invalid: Can't convert ten to a number."]
    );
    assert!(calls.lock().is_empty());
}

#[test]
fn test_restriction_failure_appends_usage() {
    let (dispatcher, transport) = dispatcher();
    let half = CommandSpec::builder("half")
        .usage("half <even number>")
        .param(ParameterSpec::new(TypeTag::LONG).restrict("even"))
        .returns(Returns::Value(TypeTag::LONG))
        .handler(|inv| value(inv.arg::<i64>(0)? / 2));
    dispatcher.register_command(half).unwrap();

    dispatcher.handle(&TestMessage::shared("!half 3")).unwrap();
    dispatcher.handle(&TestMessage::shared("!half 8")).unwrap();
    assert_eq!(
        transport.texts(),
        vec![
            "Parameter 1 is invalid: 3 does not meet the restriction.\nUsage: half <even number>",
            "4",
        ]
    );
}

#[test]
fn test_custom_restriction_message() {
    let (dispatcher, transport) = dispatcher();
    let pick = CommandSpec::builder("pick")
        .param(
            ParameterSpec::new(TypeTag::INT)
                .restrict_with(Restriction::new(">=1 & <=6").with_error("{INPUT} is not on a die.")),
        )
        .handler(|_| Ok(None));
    dispatcher.register_command(pick).unwrap();

    dispatcher.handle(&TestMessage::shared("!pick 9")).unwrap();
    assert_eq!(transport.texts(), vec!["Parameter 1 is invalid: 9 is not on a die."]);
}

#[test]
fn test_defaults_fill_missing_parameters() {
    let (dispatcher, _transport) = dispatcher();
    let calls = Calls::default();
    let greet = {
        let calls = Arc::clone(&calls);
        CommandSpec::builder("greet")
            .param(ParameterSpec::new(TypeTag::INT).default_value("3"))
            .param(ParameterSpec::new(TypeTag::STRING).combine_all().default_value("hello there"))
            .handler(move |inv| {
                calls.lock().push(inv.args().iter().cloned().collect());
                Ok(None)
            })
    };
    dispatcher.register_command(greet).unwrap();

    dispatcher.handle(&TestMessage::shared("!greet")).unwrap();
    dispatcher.handle(&TestMessage::shared("!greet 1 hi")).unwrap();
    assert_eq!(
        *calls.lock(),
        vec![
            vec![Value::Int(3), Value::Text("hello there".into())],
            vec![Value::Int(1), Value::Text("hi".into())],
        ]
    );
}

#[test]
fn test_bounded_array_leaves_remaining_tokens() {
    let (dispatcher, _transport) = dispatcher();
    let calls = Calls::default();
    let pair = {
        let calls = Arc::clone(&calls);
        CommandSpec::builder("pair")
            .param(ParameterSpec::new(TypeTag::INT.array()).combine(2))
            .param(ParameterSpec::new(TypeTag::STRING).combine_all())
            .handler(move |inv| {
                calls.lock().push(inv.args().iter().cloned().collect());
                Ok(None)
            })
    };
    dispatcher.register_command(pair).unwrap();

    dispatcher.handle(&TestMessage::shared("!pair 1 2 3 four")).unwrap();
    assert_eq!(
        *calls.lock(),
        vec![vec![
            Value::List(vec![Value::Int(1), Value::Int(2)]),
            Value::Text("3 four".into()),
        ]]
    );
}

#[test]
fn test_restricted_string_extends_until_match() {
    let (dispatcher, transport) = dispatcher();
    let say = CommandSpec::builder("say")
        .param(ParameterSpec::new(TypeTag::STRING).restrict(r"good \w+"))
        .param(ParameterSpec::new(TypeTag::STRING).default_value("friend"))
        .returns(Returns::Reply)
        .handler(|inv| reply(format!("{} / {}", inv.arg::<String>(0)?, inv.arg::<String>(1)?)));
    dispatcher.register_command(say).unwrap();

    dispatcher.handle(&TestMessage::shared("!say good morning world")).unwrap();
    dispatcher.handle(&TestMessage::shared("!say good")).unwrap();
    assert_eq!(
        transport.texts(),
        vec![
            "good morning / world",
            "Parameter 1 is invalid: good does not meet the restriction.",
        ]
    );
}

#[test]
fn test_enum_choice() {
    let (dispatcher, transport) = dispatcher();
    dispatcher
        .conversions()
        .register_enum("color", ["red", "green", "blue"])
        .unwrap();
    dispatcher
        .conversions()
        .register_serializer("color", |v: &Value| Ok(Reply::Text(format!("painted {v}"))))
        .unwrap();
    let paint = CommandSpec::builder("paint")
        .param(ParameterSpec::new("color"))
        .returns(Returns::Value("color".into()))
        .handler(|inv| value(inv.arg::<Value>(0)?));
    dispatcher.register_command(paint).unwrap();

    dispatcher.handle(&TestMessage::shared("!paint GREEN")).unwrap();
    dispatcher.handle(&TestMessage::shared("!paint mauve")).unwrap();
    assert_eq!(
        transport.texts(),
        vec!["painted green", "Parameter 1 is invalid: mauve is an invalid choice"]
    );
}

#[test]
fn test_values_use_registered_serializer() {
    let (dispatcher, transport) = dispatcher();
    dispatcher
        .conversions()
        .register_serializer(TypeTag::INT, |v: &Value| Ok(Reply::Text(format!("#{v}"))))
        .unwrap();
    let answer = CommandSpec::builder("answer")
        .returns(Returns::Value(TypeTag::INT))
        .handler(|_| value(42i64));
    dispatcher.register_command(answer).unwrap();

    dispatcher.handle(&TestMessage::shared("!answer")).unwrap();
    assert_eq!(transport.texts(), vec!["#42"]);
}

#[test]
fn test_reply_targets_route_output() {
    let (dispatcher, transport) = dispatcher();
    let whisper = CommandSpec::builder("whisper")
        .reply(ReplyTarget::Direct)
        .returns(Returns::Reply)
        .handler(|_| reply("psst"));
    let announce = CommandSpec::builder("announce")
        .reply(ReplyTarget::Channel("news".into()))
        .returns(Returns::Reply)
        .handler(|_| reply("extra"));
    let quiet = CommandSpec::builder("quiet")
        .reply(ReplyTarget::None)
        .returns(Returns::Reply)
        .handler(|_| reply("never seen"));
    let nod = CommandSpec::builder("nod")
        .reply(ReplyTarget::Reaction)
        .returns(Returns::Reply)
        .handler(|_| reply(Reply::Reaction("ok".into())));
    dispatcher
        .register(&vec![whisper, announce, quiet, nod])
        .unwrap();

    for line in ["!whisper", "!announce", "!quiet", "!nod"] {
        assert_eq!(
            dispatcher.handle(&TestMessage::shared(line)).unwrap(),
            Dispatch::Completed
        );
    }
    assert_eq!(transport.channels(), vec!["dm:alice", "news"]);
    assert_eq!(transport.texts(), vec!["psst", "extra"]);
    assert_eq!(*transport.reactions.lock(), vec!["ok"]);
}

#[test]
fn test_nothing_returning_handler_gets_reply_channel() {
    let (dispatcher, transport) = dispatcher();
    let manual = CommandSpec::builder("manual")
        .reply(ReplyTarget::General)
        .handler(|inv| {
            assert_eq!(inv.reply_channel().map(|c| c.as_str()), Some("general"));
            inv.send("by hand")?;
            Ok(None)
        });
    let valued = CommandSpec::builder("valued")
        .returns(Returns::Reply)
        .handler(|inv| {
            assert!(inv.reply_channel().is_none());
            reply("returned")
        });
    dispatcher.register(&vec![manual, valued]).unwrap();

    dispatcher.handle(&TestMessage::shared("!manual")).unwrap();
    dispatcher.handle(&TestMessage::shared("!valued")).unwrap();
    assert_eq!(transport.texts(), vec!["by hand", "returned"]);
}

#[test]
fn test_handler_failure_is_reported() {
    let (dispatcher, transport) = dispatcher();
    let broken = CommandSpec::builder("broken")
        .handler(|_| Err(anyhow::anyhow!("disk on fire").context("could not save")));
    dispatcher.register_command(broken).unwrap();

    let outcome = dispatcher.handle(&TestMessage::shared("!broken")).unwrap();
    assert_eq!(outcome, Dispatch::Failed);
    assert_eq!(
        transport.texts(),
        vec!["An error occurred. Have some details:\ncould not save\n    caused by: disk on fire"]
    );
}

#[test]
fn test_handler_panic_is_contained() {
    let (dispatcher, transport) = dispatcher();
    let panicky = CommandSpec::builder("panicky").handler(|_| panic!("boom"));
    dispatcher.register_command(panicky).unwrap();

    let outcome = dispatcher.handle(&TestMessage::shared("!panicky")).unwrap();
    assert_eq!(outcome, Dispatch::Failed);
    assert_eq!(
        transport.texts(),
        vec!["An error occurred. Have some details:\nhandler panicked: boom"]
    );

    // The dispatcher keeps working.
    assert_eq!(
        dispatcher.handle(&TestMessage::shared("!panicky")).unwrap(),
        Dispatch::Failed
    );
}

#[test]
fn test_mention_requirement() {
    let (dispatcher, transport) = dispatcher();
    dispatcher.set_mention_setting(MentionSetting::Prefix);
    let ping = CommandSpec::builder("ping").returns(Returns::Reply).handler(|_| reply("pong"));
    let free = CommandSpec::builder("free")
        .mention(MentionSetting::No)
        .returns(Returns::Reply)
        .handler(|_| reply("free"));
    dispatcher.register(&vec![ping, free]).unwrap();

    assert_eq!(
        dispatcher.handle(&TestMessage::shared("!ping")).unwrap(),
        Dispatch::Ignored(IgnoreReason::MentionRequired)
    );
    dispatcher.handle(&TestMessage::shared("@bot !ping")).unwrap();
    dispatcher.handle(&TestMessage::shared("@bot     !ping")).unwrap();
    dispatcher.handle(&TestMessage::shared("!free")).unwrap();
    dispatcher.handle(&TestMessage::shared("@bot !free")).unwrap();
    assert_eq!(transport.texts(), vec!["pong", "pong", "free", "free"]);
}

#[test]
fn test_scopes_select_namespace() {
    let (dispatcher, transport) = dispatcher();
    let secret = CommandSpec::builder("secret")
        .scope(CommandScope::PrivateOnly)
        .returns(Returns::Reply)
        .handler(|_| reply("private"));
    let public = CommandSpec::builder("secret")
        .scope(CommandScope::SharedOnly)
        .returns(Returns::Reply)
        .handler(|_| reply("shared"));
    dispatcher.register(&vec![secret, public]).unwrap();

    dispatcher.handle(&TestMessage::private("!secret")).unwrap();
    dispatcher.handle(&TestMessage::shared("!secret")).unwrap();
    assert_eq!(transport.texts(), vec!["private", "shared"]);
}

#[test]
fn test_prefix_change() {
    let (dispatcher, transport) = dispatcher();
    let ping = CommandSpec::builder("ping").returns(Returns::Reply).handler(|_| reply("pong"));
    dispatcher.register_command(ping).unwrap();
    dispatcher.set_prefix("bot,");

    assert_eq!(dispatcher.prefix(), "bot,");
    dispatcher.handle(&TestMessage::shared("!ping")).unwrap();
    dispatcher.handle(&TestMessage::shared("bot, ping")).unwrap();
    assert_eq!(transport.texts(), vec!["pong"]);
}

#[test]
fn test_usage_stats_count_dispatches() {
    let (dispatcher, _transport) = dispatcher();
    let a = CommandSpec::builder("a").aliases("alpha").handler(|_| Ok(None));
    let b = CommandSpec::builder("b").handler(|_| Ok(None));
    let c = CommandSpec::builder("c").handler(|_| Ok(None));
    dispatcher.register(&vec![a, b, c]).unwrap();

    for line in ["!a", "!alpha", "!b", "!a"] {
        dispatcher.handle(&TestMessage::shared(line)).unwrap();
    }
    assert_eq!(
        dispatcher.usage_stats(),
        vec![("a".to_string(), 3), ("b".to_string(), 1)]
    );
}

#[test]
fn test_contract_violation_is_definition_error() {
    let (dispatcher, transport) = dispatcher();
    dispatcher
        .conversions()
        .register_deserializer(
            "lazy",
            |_t: &[String], _m: usize, _r: Option<&Restriction>| -> Result<Converted, ConvertError> {
                Ok(Converted {
                    value: Value::Int(0),
                    consumed: 0,
                })
            },
        )
        .unwrap();
    let lazy = CommandSpec::builder("lazy")
        .param(ParameterSpec::new("lazy"))
        .handler(|_| Ok(None));
    dispatcher.register_command(lazy).unwrap();

    let err = dispatcher.handle(&TestMessage::shared("!lazy x")).unwrap_err();
    match err {
        DefinitionError::Conversion { command, index, source } => {
            assert_eq!(command, "lazy");
            assert_eq!(index, 1);
            assert!(matches!(source, ConvertError::Contract { consumed: 0, .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        transport.texts(),
        vec!["The lazy command is misconfigured. The problem has been logged."]
    );
}

#[test]
fn test_malformed_restriction_is_definition_error() {
    let (dispatcher, _transport) = dispatcher();
    let odd = CommandSpec::builder("odd")
        .param(ParameterSpec::new(TypeTag::INT).restrict(">>2"))
        .handler(|_| Ok(None));
    dispatcher.register_command(odd).unwrap();

    let err = dispatcher.handle(&TestMessage::shared("!odd 3")).unwrap_err();
    assert_eq!(err.error_code(), "invalid_condition");
}

#[test]
fn test_usage_stats_skip_denied_and_invalid_lines() {
    let (dispatcher, _transport) = dispatcher();
    let gated = CommandSpec::builder("gated").capability("admin").handler(|_| Ok(None));
    let number = CommandSpec::builder("number")
        .param(ParameterSpec::new(TypeTag::INT))
        .handler(|_| Ok(None));
    dispatcher.register(&vec![gated, number]).unwrap();

    assert_eq!(dispatcher.handle(&TestMessage::shared("!gated")).unwrap(), Dispatch::Denied);
    assert_eq!(
        dispatcher.handle(&TestMessage::shared("!number x")).unwrap(),
        Dispatch::InvalidParameter { index: 1 }
    );
    assert_eq!(dispatcher.handle(&TestMessage::shared("!number")).unwrap(), Dispatch::Usage);
    assert!(dispatcher.usage_stats().is_empty());

    dispatcher.handle(&TestMessage::shared("!number 4")).unwrap();
    assert_eq!(dispatcher.usage_stats(), vec![("number".to_string(), 1)]);
}

#[test]
fn test_concurrent_dispatch_and_late_registration() {
    const WORKERS: usize = 4;
    const LINES_PER_WORKER: usize = 200;
    const LATE_COMMANDS: usize = 50;

    let (dispatcher, transport) = dispatcher();
    let add = CommandSpec::builder("add")
        .param(ParameterSpec::new(TypeTag::LONG))
        .param(ParameterSpec::new(TypeTag::LONG))
        .returns(Returns::Value(TypeTag::LONG))
        .handler(|inv| value(inv.arg::<i64>(0)? + inv.arg::<i64>(1)?));
    dispatcher.register_command(add).unwrap();
    let dispatcher = Arc::new(dispatcher);

    std::thread::scope(|s| {
        for worker in 0..WORKERS {
            let dispatcher = Arc::clone(&dispatcher);
            s.spawn(move || {
                for i in 0..LINES_PER_WORKER {
                    let line = format!("!add {worker} {i}");
                    let outcome = dispatcher.handle(&TestMessage::shared(&line)).unwrap();
                    assert_eq!(outcome, Dispatch::Completed);
                }
            });
        }

        let dispatcher = Arc::clone(&dispatcher);
        s.spawn(move || {
            for n in 0..LATE_COMMANDS {
                let late = CommandSpec::builder(format!("late{n}"))
                    .returns(Returns::Reply)
                    .handler(|_| reply("late"));
                dispatcher.register_command(late).unwrap();
            }
        });
    });

    let texts = transport.texts();
    assert_eq!(texts.len(), WORKERS * LINES_PER_WORKER);
    for worker in 0..WORKERS {
        for i in 0..LINES_PER_WORKER {
            let sum = (worker + i).to_string();
            assert!(texts.contains(&sum), "missing reply {sum}");
        }
    }
    assert_eq!(
        dispatcher.usage_stats(),
        vec![("add".to_string(), (WORKERS * LINES_PER_WORKER) as u64)]
    );

    for n in 0..LATE_COMMANDS {
        let name = format!("late{n}");
        assert!(dispatcher.commands().lookup(Scope::Shared, &name).is_some());
    }
    transport.clear();
    dispatcher.handle(&TestMessage::shared("!late49")).unwrap();
    assert_eq!(transport.texts(), vec!["late"]);
}
