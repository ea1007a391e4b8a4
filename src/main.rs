use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_xoshiro::Xoshiro256PlusPlus;
use robins_dice_expr::{dice_roll::ExpressionEvaluate, parser, SavedRolls};
use std::time::{Duration, Instant};

fn main() {
    pretty_env_logger::init();

    let mut pool_mode = false;
    let mut rolls_path: Option<String> = None;
    let mut expression_parts: Vec<String> = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--pool" => pool_mode = true,
            "--rolls" => {
                rolls_path = Some(args.next().expect("--rolls requires a file path"))
            }
            _ => expression_parts.push(arg),
        }
    }
    if expression_parts.is_empty() {
        eprintln!("usage: expr-cmd [--pool] [--rolls FILE.toml] EXPRESSION...");
        std::process::exit(2);
    }
    let expression_str = expression_parts.join(" ");

    let saved_rolls: SavedRolls = match rolls_path {
        Some(path) => {
            let content =
                std::fs::read_to_string(&path).expect("unable to read the saved roll file");
            let table: SavedRolls =
                toml::from_str(&content).expect("unable to parse the saved roll file");
            table
                .into_iter()
                .map(|(name, text)| (name.to_lowercase(), text))
                .collect()
        }
        None => SavedRolls::new(),
    };

    let mut master_rng = ChaCha20Rng::from_entropy();
    let mut seed: <Xoshiro256PlusPlus as SeedableRng>::Seed = Default::default();
    master_rng.fill(&mut seed);
    let mut rng = Xoshiro256PlusPlus::from_seed(seed);

    let start = Instant::now();
    let mut timeout_f = move || start.elapsed() > Duration::from_secs(2);

    let output = if pool_mode {
        roll_pool(&expression_str, &mut timeout_f, &mut rng)
    } else {
        roll_expression(&expression_str, &saved_rolls, &mut timeout_f, &mut rng)
    };

    match output {
        Ok(text) => println!("{}", text),
        Err(message) => {
            println!("{}", message);
            std::process::exit(1);
        }
    }
}

fn roll_expression<T: FnMut() -> bool, R: Rng>(
    input: &str,
    saved_rolls: &SavedRolls,
    timeout_f: &mut T,
    rng: &mut R,
) -> Result<String, String> {
    let expression =
        parser::parse_expression(input, saved_rolls).map_err(|err| err.to_string())?;
    log::debug!("Expression: {}", expression);
    expression
        .eval_and_print(timeout_f, rng)
        .map_err(|err| err.to_string())
}

fn roll_pool<T: FnMut() -> bool, R: Rng>(
    input: &str,
    timeout_f: &mut T,
    rng: &mut R,
) -> Result<String, String> {
    let pool = parser::parse_dice_pool(input).map_err(|err| err.to_string())?;
    log::debug!("Pool: {}", pool);
    pool.eval_and_print(timeout_f, rng)
        .map_err(|err| err.to_string())
}
