//! Demo commands served by the console binary.

use std::fmt;

use botcmd::command::{
    CommandScope, CommandSource, CommandSpec, ParameterSpec, ReplyTarget, Returns, reply, value,
};
use botcmd::convert::{Choice, ConversionRegistry, Converted, Reply, TypeTag, Value};
use botcmd::error::{ConvertError, DeserializeError, RegistrationError};
use botcmd::metrics;
use botcmd_proto::Restriction;
use rand::Rng;
use regex::Regex;

const DICE: TypeTag = TypeTag::from_static("dice");
const COIN: TypeTag = TypeTag::from_static("coin");

/// A dice roll in `NdM` notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dice {
    count: u32,
    sides: u32,
}

impl fmt::Display for Dice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)
    }
}

fn parse_dice(pattern: &Regex, token: &str) -> Result<Dice, DeserializeError> {
    let invalid = || DeserializeError::with_usage(format!("{token} is not dice notation like 3d6."));
    let caps = pattern.captures(token).ok_or_else(invalid)?;
    let count = match caps.get(1) {
        Some(m) => m.as_str().parse().map_err(|_| invalid())?,
        None => 1,
    };
    let sides: u32 = caps[2].parse().map_err(|_| invalid())?;
    if count == 0 || sides < 2 {
        return Err(DeserializeError::new(format!("{token} rolls nothing.")));
    }
    Ok(Dice { count, sides })
}

/// Dice, echo, coin flips, sums and stats.
pub struct DemoCommands {
    dice: Regex,
}

impl DemoCommands {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            dice: Regex::new(r"^(\d{1,3})?[dD](\d{1,4})$")?,
        })
    }
}

impl CommandSource for DemoCommands {
    fn register_converters(&self, conversions: &ConversionRegistry) -> Result<(), RegistrationError> {
        let pattern = self.dice.clone();
        conversions.register_deserializer(
            DICE,
            move |tokens: &[String], _max: usize, restriction: Option<&Restriction>| -> Result<Converted, ConvertError> {
                let token = &tokens[0];
                let dice = parse_dice(&pattern, token)?;
                if let Some(r) = restriction {
                    if !r.allows(i64::from(dice.count))? {
                        return Err(DeserializeError {
                            message: r.failure_message(token),
                            show_usage: r.failure_shows_usage(),
                        }
                        .into());
                    }
                }
                Ok(Converted::single(Value::object(dice)))
            },
        )?;
        conversions.register_enum(COIN, ["heads", "tails"])
    }

    fn commands(&self) -> Vec<CommandSpec> {
        let roll = CommandSpec::builder("roll")
            .aliases("r dice")
            .usage("roll [NdM]")
            .description("Rolls dice. At most 100 of them.")
            .param(ParameterSpec::new(DICE).default_value("1d6").restrict("<=100").label("dice"))
            .returns(Returns::Reply)
            .handler(|inv| {
                let dice = inv.args().object::<Dice>(0)?;
                let mut rng = rand::thread_rng();
                let rolls: Vec<u32> = (0..dice.count).map(|_| rng.gen_range(1..=dice.sides)).collect();
                let total: u64 = rolls.iter().copied().map(u64::from).sum();
                let shown: Vec<String> = rolls.iter().map(u32::to_string).collect();
                reply(format!("Rolled {dice}: {} (total {total})", shown.join(", ")))
            });

        let echo = CommandSpec::builder("echo")
            .usage("echo <text>")
            .description("Says the text back.")
            .param(ParameterSpec::new(TypeTag::STRING).combine_all().label("text"))
            .returns(Returns::Value(TypeTag::STRING))
            .handler(|inv| value(inv.arg::<String>(0)?));

        let flip = CommandSpec::builder("flip")
            .usage("flip <heads|tails>")
            .description("Flips a coin against your call.")
            .param(ParameterSpec::new(COIN).label("call"))
            .returns(Returns::Reply)
            .handler(|inv| {
                let call = inv.arg::<Choice>(0)?;
                let landed = if rand::thread_rng().gen_bool(0.5) { "heads" } else { "tails" };
                let verdict = if call.name() == landed { "You win." } else { "You lose." };
                reply(format!("It landed {landed}. {verdict}"))
            });

        let sum = CommandSpec::builder("sum")
            .usage("sum <numbers...>")
            .description("Adds whole numbers.")
            .param(ParameterSpec::new(TypeTag::LONG.array()).combine_all().label("numbers"))
            .returns(Returns::Value(TypeTag::LONG))
            .handler(|inv| {
                let numbers = inv.arg::<Vec<i64>>(0)?;
                let total = numbers
                    .iter()
                    .try_fold(0i64, |acc, n| acc.checked_add(*n))
                    .ok_or_else(|| anyhow::anyhow!("the sum does not fit in 64 bits"))?;
                value(total)
            });

        let nod = CommandSpec::builder("nod")
            .scope(CommandScope::SharedOnly)
            .description("Acknowledges you.")
            .reply(ReplyTarget::Reaction)
            .returns(Returns::Reply)
            .handler(|_| reply(Reply::Reaction("thumbsup".to_string())));

        let stats = CommandSpec::builder("stats")
            .description("Shows command counters.")
            .capability("operator")
            .reply(ReplyTarget::Direct)
            .returns(Returns::Reply)
            .handler(|_| {
                let counters: Vec<String> = metrics::gather_metrics()
                    .lines()
                    .filter(|line| line.starts_with("botcmd_command_total"))
                    .map(str::to_string)
                    .collect();
                if counters.is_empty() {
                    return reply("No commands counted yet.");
                }
                reply(counters.join("\n"))
            });

        vec![roll, echo, flip, sum, nod, stats]
    }
}
