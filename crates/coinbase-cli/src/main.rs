//! Coinbase Exchange CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 상품 목록과 시세
//! cbx symbols
//! cbx ticker BTC-USD
//!
//! # 2024-01-01부터 1분 캔들 기반 체결 백필 (최대 500건)
//! cbx history BTC-USD --since 2024-01-01 --limit 500
//!
//! # 자격증명 번들 생성 후 주문
//! cbx seal-credentials --output credentials.json --generate-key
//! COINBASE__CREDENTIALS_PATH=credentials.json cbx buy BTC-USD 0.01 25000
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use coinbase_cli::commands::credentials::{resolve_master_key, seal_credentials, CredentialInput};
use coinbase_cli::commands::output::OutputFormat;
use coinbase_cli::commands::{account, market};
use coinbase_core::{init_logging, ConnectorConfig, LogConfig, Side};
use coinbase_exchange::CoinbaseClient;
use secrecy::ExposeSecret;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "cbx")]
#[command(about = "Coinbase Exchange CLI - 시세 조회, 과거 체결 백필, 주문 관리", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 (TOML, 없으면 기본값과 환경 변수만 사용)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 출력 형식 (table, json)
    #[arg(short, long, global = true, default_value = "table")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 거래 가능한 상품 목록
    Symbols,

    /// 현재 시세
    Ticker {
        /// 심볼 (예: BTC-USD, BTC/USD)
        symbol: String,
    },

    /// 호가창
    Book {
        /// 심볼
        symbol: String,

        /// 표시할 호가 단계 수
        #[arg(short, long, default_value = "10")]
        depth: usize,
    },

    /// 최근 체결
    Trades {
        /// 심볼
        symbol: String,
    },

    /// 과거 체결 백필 (시작 시점이 없으면 최근 페이지 하나)
    History {
        /// 심볼
        symbol: String,

        /// 시작 시점 (RFC 3339 또는 YYYY-MM-DD)
        #[arg(short, long)]
        since: Option<String>,

        /// 최대 출력 건수
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// 사용 가능 잔고
    Balances,

    /// 주문 목록
    Orders {
        /// 심볼 필터
        #[arg(short, long)]
        symbol: Option<String>,
    },

    /// 주문 상세
    Order {
        /// 주문 ID
        id: String,
    },

    /// 주문 취소
    Cancel {
        /// 주문 ID
        id: String,
    },

    /// 지정가 매수
    Buy {
        /// 심볼
        symbol: String,
        /// 수량
        amount: String,
        /// 가격
        price: String,
    },

    /// 지정가 매도
    Sell {
        /// 심볼
        symbol: String,
        /// 수량
        amount: String,
        /// 가격
        price: String,
    },

    /// 환경 변수의 API 키를 암호화된 번들 파일로 저장
    SealCredentials {
        /// 출력 파일 경로
        #[arg(short, long, default_value = "credentials.json")]
        output: PathBuf,

        /// 새 마스터 키 생성 (없으면 COINBASE_MASTER_KEY 사용)
        #[arg(long, default_value = "false")]
        generate_key: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env는 선택 사항
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = ConnectorConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_logging(LogConfig::from(&config.logging))
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let format = OutputFormat::parse(&cli.format)?;

    if let Commands::SealCredentials { output, generate_key } = &cli.command {
        let input = CredentialInput::from_env()?;
        let (master_key, generated) = resolve_master_key(*generate_key)?;
        seal_credentials(&input, &master_key, output)?;

        println!("자격증명 번들 저장 완료: {}", output.display());
        if generated {
            println!("새 마스터 키 (안전한 곳에 보관하세요):");
            println!("{}", master_key.expose_secret());
        }
        return Ok(());
    }

    let mut client = CoinbaseClient::from_config(&config).context("Failed to create client")?;
    info!("Using {}", config.rest_url());

    let result = run(&mut client, cli.command, format).await;
    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

async fn run(client: &mut CoinbaseClient, command: Commands, format: OutputFormat) -> Result<()> {
    let output = match command {
        Commands::Symbols => market::symbols(client, format).await?,
        Commands::Ticker { symbol } => market::ticker(client, &symbol, format).await?,
        Commands::Book { symbol, depth } => market::order_book(client, &symbol, depth, format).await?,
        Commands::Trades { symbol } => market::recent_trades(client, &symbol, format).await?,
        Commands::History { symbol, since, limit } => {
            let since = since.as_deref().map(market::parse_since).transpose()?;
            let mut stdout = std::io::stdout().lock();
            let count = market::history(client, &symbol, since, limit, format, &mut stdout).await?;
            if format == OutputFormat::Table {
                format!("\nTotal: {} trades", count)
            } else {
                return Ok(());
            }
        }
        Commands::Balances => account::balances(client, format).await?,
        Commands::Orders { symbol } => account::orders(client, symbol.as_deref(), format).await?,
        Commands::Order { id } => account::order(client, &id, format).await?,
        Commands::Cancel { id } => account::cancel(client, &id).await?,
        Commands::Buy { symbol, amount, price } => {
            account::place(client, Side::Buy, &symbol, &amount, &price, format).await?
        }
        Commands::Sell { symbol, amount, price } => {
            account::place(client, Side::Sell, &symbol, &amount, &price, format).await?
        }
        Commands::SealCredentials { .. } => return Ok(()),
    };

    println!("{}", output);
    Ok(())
}
