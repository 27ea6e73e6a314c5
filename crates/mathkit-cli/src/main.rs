mod config;
mod input;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use mathkit_core::{
    correlation_matrix, describe, linear_regression, normalize, parse_equation, solve_linear,
    solve_quadratic, solve_system_2x2, CorrelationMatrix, DataPoint, LinearSolution,
    Normalization, NormalizeMethod, ParsedEquation, QuadraticSolution, RegressionModel,
    SolvedEquation, StatsSummary, SystemRow, SystemSolution,
};

use crate::config::{Config, OutputFormat};
use crate::input::{parse_named, parse_values, values_or_stdin};

#[derive(Parser)]
#[command(
    name = "mathkit",
    version,
    about = "Solve equations and summarize numeric datasets"
)]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Decimal places in text output
    #[arg(short, long, global = true)]
    precision: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a·x + b = 0
    Linear {
        #[arg(allow_negative_numbers = true)]
        a: f64,
        #[arg(allow_negative_numbers = true)]
        b: f64,
    },

    /// Solve a·x² + b·x + c = 0
    Quadratic {
        #[arg(allow_negative_numbers = true)]
        a: f64,
        #[arg(allow_negative_numbers = true)]
        b: f64,
        #[arg(allow_negative_numbers = true)]
        c: f64,
    },

    /// Solve a1·x + b1·y = c1, a2·x + b2·y = c2
    System {
        #[arg(allow_negative_numbers = true)]
        a1: f64,
        #[arg(allow_negative_numbers = true)]
        b1: f64,
        #[arg(allow_negative_numbers = true)]
        c1: f64,
        #[arg(allow_negative_numbers = true)]
        a2: f64,
        #[arg(allow_negative_numbers = true)]
        b2: f64,
        #[arg(allow_negative_numbers = true)]
        c2: f64,
    },

    /// Parse a free-text equation such as "x^2 - 5x + 6 = 0"
    Parse {
        /// Equation text
        #[arg(allow_hyphen_values = true)]
        text: String,

        /// Also solve the parsed equation
        #[arg(short, long)]
        solve: bool,
    },

    /// Descriptive statistics for a sample
    Describe {
        /// Comma- or whitespace-separated values (reads stdin if omitted)
        #[arg(allow_hyphen_values = true)]
        values: Option<String>,
    },

    /// Least-squares line through paired samples
    Regress {
        /// x values
        #[arg(short, long, allow_hyphen_values = true)]
        x: String,

        /// y values, index-aligned with x
        #[arg(short, long, allow_hyphen_values = true)]
        y: String,

        /// Evaluate the fitted line at this x
        #[arg(long, allow_negative_numbers = true)]
        predict: Option<f64>,
    },

    /// Correlation matrix over named samples
    Correlate {
        /// Named sample, e.g. --var height=1.5,1.7,1.8 (repeat for each variable)
        #[arg(short, long = "var", required = true, allow_hyphen_values = true)]
        vars: Vec<String>,
    },

    /// Rescale a sample
    Normalize {
        /// Comma- or whitespace-separated values (reads stdin if omitted)
        #[arg(allow_hyphen_values = true)]
        values: Option<String>,

        /// Normalization method (default from config, else zscore)
        #[arg(short, long)]
        method: Option<CliMethod>,
    },

    /// Show current configuration
    Config,
}

#[derive(Clone, ValueEnum)]
enum CliMethod {
    Zscore,
    Minmax,
    Robust,
}

impl From<CliMethod> for NormalizeMethod {
    fn from(val: CliMethod) -> Self {
        match val {
            CliMethod::Zscore => NormalizeMethod::ZScore,
            CliMethod::Minmax => NormalizeMethod::MinMax,
            CliMethod::Robust => NormalizeMethod::Robust,
        }
    }
}

/// Resolved output settings: CLI flags win over the config file.
struct Output {
    json: bool,
    precision: usize,
}

impl Output {
    fn new(cli: &Cli, cfg: &Config) -> Self {
        Self {
            json: cli.json || cfg.output.format == OutputFormat::Json,
            precision: cli.precision.unwrap_or(cfg.output.precision),
        }
    }

    fn num(&self, v: f64) -> String {
        format!("{v:.p$}", p = self.precision)
    }

    fn list(&self, values: &[f64]) -> String {
        values
            .iter()
            .map(|v| self.num(*v))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn emit_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config()?;
    let out = Output::new(&cli, &cfg);

    match cli.command {
        Commands::Linear { a, b } => cmd_linear(&out, a, b),
        Commands::Quadratic { a, b, c } => cmd_quadratic(&out, a, b, c),
        Commands::System {
            a1,
            b1,
            c1,
            a2,
            b2,
            c2,
        } => cmd_system(
            &out,
            SystemRow::new(a1, b1, c1),
            SystemRow::new(a2, b2, c2),
        ),
        Commands::Parse { text, solve } => cmd_parse(&out, &text, solve),
        Commands::Describe { values } => cmd_describe(&out, values),
        Commands::Regress { x, y, predict } => cmd_regress(&out, &x, &y, predict),
        Commands::Correlate { vars } => cmd_correlate(&out, &vars),
        Commands::Normalize { values, method } => {
            let method = method.map(Into::into).unwrap_or(cfg.normalize.method);
            cmd_normalize(&out, values, method)
        }
        Commands::Config => cmd_config(&cfg),
    }
}

// ---------------------------------------------------------------------------
// Equation commands
// ---------------------------------------------------------------------------

fn cmd_linear(out: &Output, a: f64, b: f64) -> Result<()> {
    let sol = solve_linear(a, b)?;
    if out.json {
        return out.emit_json(&sol);
    }
    print_linear(out, &sol);
    Ok(())
}

fn cmd_quadratic(out: &Output, a: f64, b: f64, c: f64) -> Result<()> {
    let sol = solve_quadratic(a, b, c)?;
    if out.json {
        return out.emit_json(&sol);
    }
    print_quadratic(out, &sol);
    Ok(())
}

fn cmd_system(out: &Output, eq1: SystemRow, eq2: SystemRow) -> Result<()> {
    let sol = solve_system_2x2(eq1, eq2)?;
    if out.json {
        return out.emit_json(&sol);
    }
    print_system(out, &sol);
    Ok(())
}

fn cmd_parse(out: &Output, text: &str, solve: bool) -> Result<()> {
    let parsed = match parse_equation(text) {
        Ok(p) => p,
        Err(failure) => {
            if out.json {
                return out.emit_json(&failure);
            }
            println!("Could not recognize: {}", failure.input);
            println!("Try one of:");
            for s in &failure.suggestions {
                println!("  {s}");
            }
            return Ok(());
        }
    };

    let solution = if solve { Some(parsed.solve()?) } else { None };

    if out.json {
        #[derive(Serialize)]
        struct ParseOutput<'a> {
            #[serde(flatten)]
            parsed: &'a ParsedEquation,
            #[serde(skip_serializing_if = "Option::is_none")]
            solution: Option<&'a SolvedEquation>,
        }
        return out.emit_json(&ParseOutput {
            parsed: &parsed,
            solution: solution.as_ref(),
        });
    }

    println!("Type:      {}", parsed.kind);
    println!("Equation:  {}", parsed.formatted);
    println!("Pattern:   {}", parsed.pattern);
    match solution {
        Some(SolvedEquation::Linear(sol)) => print_linear(out, &sol),
        Some(SolvedEquation::Quadratic(sol)) => print_quadratic(out, &sol),
        None => {}
    }
    Ok(())
}

fn print_linear(out: &Output, sol: &LinearSolution) {
    println!("x = {}", out.num(sol.x));
    println!("check: a·x + b = {}", out.num(sol.verification));
}

fn print_quadratic(out: &Output, sol: &QuadraticSolution) {
    println!("Discriminant: {}", out.num(sol.discriminant));
    println!("Roots ({}):", sol.kind);
    for (i, root) in sol.solutions.iter().enumerate() {
        match root.as_real() {
            Some(x) => println!("  x{} = {}", i + 1, out.num(x)),
            None => println!("  x{} = {root}", i + 1),
        }
    }
    if let Some(checks) = &sol.verification {
        for c in checks {
            let mark = if c.valid { "ok" } else { "FAILED" };
            println!("  f({}) = {} [{mark}]", out.num(c.root), out.num(c.value));
        }
    }
}

fn print_system(out: &Output, sol: &SystemSolution) {
    println!("x = {}", out.num(sol.x));
    println!("y = {}", out.num(sol.y));
    println!("Determinant: {}", out.num(sol.determinant));
    println!(
        "check: row1 = {}, row2 = {}",
        out.num(sol.verification.0),
        out.num(sol.verification.1)
    );
}

// ---------------------------------------------------------------------------
// Dataset commands
// ---------------------------------------------------------------------------

fn cmd_describe(out: &Output, values: Option<String>) -> Result<()> {
    let sample = values_or_stdin(values)?;
    let summary = describe(&sample)?;
    if out.json {
        return out.emit_json(&summary);
    }
    print_summary(out, &summary);
    Ok(())
}

fn print_summary(out: &Output, s: &StatsSummary) {
    println!("Count:     {}", s.count);
    println!("Sum:       {}", out.num(s.sum));
    println!("Mean:      {}", out.num(s.mean));
    println!("Median:    {}", out.num(s.median));
    if s.mode.is_empty() {
        println!("Mode:      (none)");
    } else {
        println!("Mode:      {}", out.list(&s.mode));
    }
    println!("Min:       {}", out.num(s.min));
    println!("Max:       {}", out.num(s.max));
    println!("Range:     {}", out.num(s.range));
    println!("Variance:  {}", out.num(s.variance));
    println!("Std dev:   {}", out.num(s.std_dev));
    println!(
        "Quartiles: q1={} q2={} q3={} (IQR {})",
        out.num(s.quartiles.q1),
        out.num(s.quartiles.q2),
        out.num(s.quartiles.q3),
        out.num(s.quartiles.iqr)
    );
    if s.outliers.is_empty() {
        println!("Outliers:  (none)");
    } else {
        println!("Outliers:  {}", out.list(&s.outliers));
    }
    if let Some(skew) = s.skewness {
        println!("Skewness:  {}", out.num(skew));
    }
    if let Some(kurt) = s.kurtosis {
        println!("Kurtosis:  {}", out.num(kurt));
    }
}

fn cmd_regress(out: &Output, x: &str, y: &str, predict: Option<f64>) -> Result<()> {
    let xs = parse_values(x).context("parsing --x")?;
    let ys = parse_values(y).context("parsing --y")?;
    if xs.len() != ys.len() {
        anyhow::bail!(
            "malformed sample: --x has {} values but --y has {}",
            xs.len(),
            ys.len()
        );
    }
    let points: Vec<DataPoint> = xs
        .into_iter()
        .zip(ys)
        .map(|(x, y)| DataPoint::new(x, y))
        .collect();

    let model = linear_regression(&points)?;
    if out.json {
        #[derive(Serialize)]
        struct RegressOutput<'a> {
            #[serde(flatten)]
            model: &'a RegressionModel,
            #[serde(skip_serializing_if = "Option::is_none")]
            prediction: Option<DataPoint>,
        }
        return out.emit_json(&RegressOutput {
            model: &model,
            prediction: predict.map(|x| DataPoint::new(x, model.predict(x))),
        });
    }

    println!("{}", model.equation(out.precision));
    println!("n:           {}", model.n);
    match model.correlation {
        Some(r) => println!("Correlation: {}", out.num(r)),
        None => println!("Correlation: n/a (y is constant)"),
    }
    println!("R²:          {}", out.num(model.r_squared));
    println!("MSE:         {}", out.num(model.mse));
    println!("RMSE:        {}", out.num(model.rmse));
    println!("MAE:         {}", out.num(model.mae));
    println!();
    println!("{:>14} {:>14} {:>14} {:>14}", "x", "y", "predicted", "residual");
    for p in &model.points {
        println!(
            "{:>14} {:>14} {:>14} {:>14}",
            out.num(p.x),
            out.num(p.y),
            out.num(p.predicted),
            out.num(p.residual)
        );
    }
    if let Some(x) = predict {
        println!();
        println!("Prediction at x={}: {}", out.num(x), out.num(model.predict(x)));
    }
    Ok(())
}

fn cmd_correlate(out: &Output, vars: &[String]) -> Result<()> {
    let named = vars
        .iter()
        .map(|v| parse_named(v))
        .collect::<Result<Vec<_>>>()?;
    let matrix = correlation_matrix(&named)?;
    if out.json {
        return out.emit_json(&matrix);
    }
    print_matrix(out, &matrix);
    Ok(())
}

fn print_matrix(out: &Output, m: &CorrelationMatrix) {
    let width = m
        .variables
        .iter()
        .map(|v| v.len())
        .max()
        .unwrap_or(0)
        .max(out.precision + 4);

    print!("{:width$}", "");
    for v in &m.variables {
        print!(" {v:>width$}");
    }
    println!();
    for (name, row) in m.variables.iter().zip(&m.matrix) {
        print!("{name:width$}");
        for r in row {
            print!(" {:>width$}", out.num(*r));
        }
        println!();
    }

    println!();
    for pair in &m.interpretations {
        let p = pair
            .p_value
            .map(|p| format!("p={}", out.num(p)))
            .unwrap_or_else(|| "p=n/a".into());
        println!(
            "{} ~ {}: r={} {p} ({})",
            pair.first,
            pair.second,
            out.num(pair.r),
            pair.description
        );
    }
}

fn cmd_normalize(out: &Output, values: Option<String>, method: NormalizeMethod) -> Result<()> {
    let sample = values_or_stdin(values)?;
    let result = normalize(&sample, method)?;
    if out.json {
        return out.emit_json(&result);
    }
    print_normalization(out, &result)
}

fn print_normalization(out: &Output, n: &Normalization) -> Result<()> {
    println!("Method:     {}", n.method);
    println!("Parameters: {}", serde_json::to_string(&n.parameters)?);
    println!("Normalized: {}", out.list(&n.normalized));
    println!();
    println!("{:<8} {:>14} {:>14}", "", "before", "after");
    let rows = [
        ("mean", n.before.mean, n.after.mean),
        ("std", n.before.std_dev, n.after.std_dev),
        ("min", n.before.min, n.after.min),
        ("max", n.before.max, n.after.max),
    ];
    for (label, before, after) in rows {
        println!("{label:<8} {:>14} {:>14}", out.num(before), out.num(after));
    }
    Ok(())
}

fn cmd_config(cfg: &Config) -> Result<()> {
    println!("Config: {}", config::show_config_path());
    println!();
    println!("[output]");
    println!(
        "  format = {}",
        match cfg.output.format {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    );
    println!("  precision = {}", cfg.output.precision);
    println!();
    println!("[normalize]");
    println!("  method = {}", cfg.normalize.method);
    Ok(())
}
