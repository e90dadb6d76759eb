// Application configuration, loaded from environment variables and CLI flags.

use crate::ladder::LadderRules;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database URL (SQLite connection string).
    pub database_url: String,
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Rank-change tunables for the ladder.
    pub rules: LadderRules,
}

impl Config {
    /// Load configuration from environment variables and CLI arguments.
    ///
    /// Environment variables:
    /// - `DATABASE_URL` - SQLite connection string (default: `sqlite:ladder.db?mode=rwc`)
    /// - `PORT` - HTTP server port (default: 3000)
    /// - `MIN_RANK_DIFFERENCE` - challenge window and swap/reinsert threshold (default: 6)
    /// - `UPRANK_RANK_DIFFERENCE` - positions a winner climbs on a major upset (default: 3)
    /// - `DOWNRANK_RANK_DIFFERENCE` - positions a beaten favorite drops on a major upset (default: 3)
    ///
    /// CLI flags:
    /// - `--port <PORT>` - Override the port
    pub fn load() -> Self {
        let args: Vec<String> = std::env::args().collect();

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:ladder.db?mode=rwc".to_string());

        // Port: CLI flag --port takes precedence, then env var, then default
        let port = Self::parse_cli_value(&args, "--port")
            .and_then(|v| v.parse().ok())
            .or_else(|| std::env::var("PORT").ok().and_then(|v| v.parse().ok()))
            .unwrap_or(3000);

        let defaults = LadderRules::default();
        let rules = LadderRules {
            min_rank_difference: Self::rule_from_env(
                "MIN_RANK_DIFFERENCE",
                defaults.min_rank_difference,
            ),
            uprank_rank_difference: Self::rule_from_env(
                "UPRANK_RANK_DIFFERENCE",
                defaults.uprank_rank_difference,
            ),
            downrank_rank_difference: Self::rule_from_env(
                "DOWNRANK_RANK_DIFFERENCE",
                defaults.downrank_rank_difference,
            ),
        };

        Config {
            database_url,
            port,
            rules,
        }
    }

    /// Read a rule tunable from the environment. Unset, unparseable and
    /// negative values all fall back to the default.
    fn rule_from_env(var: &str, default: i64) -> i64 {
        std::env::var(var)
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|v| *v >= 0)
            .unwrap_or(default)
    }

    /// Parse a CLI flag value like `--port 8080`.
    fn parse_cli_value(args: &[String], flag: &str) -> Option<String> {
        args.windows(2).find_map(|pair| {
            if pair[0] == flag {
                Some(pair[1].clone())
            } else {
                None
            }
        })
    }
}
