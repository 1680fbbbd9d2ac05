//! CLI commands and argument parsing
//!
//! This module defines the `azs` command-line interface using clap and
//! dispatches each subcommand to the matching storage facade.

use crate::blob::BlobStorage;
use crate::config::{init_default_config, Config, StorageAccount};
use crate::error::{AzstoreError, Result};
use crate::file::FileStorage;
use crate::models::{DownloadDataType, DownloadedData, UploadDataType};
use crate::queue::{QueueMessage, QueueStorage, User};
use crate::table::{Merchant, Reseller, TableEntity, TableStorage};
use crate::utils::format::{format_table, print_items, to_json, ListingRow, NameRow};
use crate::utils::network::{create_http_client, NetworkConfig};
use clap::{Parser, Subcommand};
use reqwest::Client;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tabled::Tabled;
use uuid::Uuid;

fn parse_download_type(s: &str) -> std::result::Result<DownloadDataType, String> {
    DownloadDataType::from_str(s).map_err(|e| e.to_string())
}

fn parse_upload_type(s: &str) -> std::result::Result<UploadDataType, String> {
    UploadDataType::from_str(s).map_err(|e| e.to_string())
}

#[derive(Parser)]
#[command(name = "azs")]
#[command(about = "Blob, file share, queue and table operations on an Azure Storage account")]
#[command(version, author)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Blob container operations
    Blob {
        #[command(subcommand)]
        command: BlobCommands,
    },
    /// File share operations
    File {
        #[command(subcommand)]
        command: FileCommands,
    },
    /// Queue operations
    Queue {
        #[command(subcommand)]
        command: QueueCommands,
    },
    /// Table operations
    Table {
        #[command(subcommand)]
        command: TableCommands,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum BlobCommands {
    /// Download a blob
    Get {
        container: String,
        blob: String,
        /// Shape of the content: text, bytes or stream
        #[arg(short = 't', long = "type", default_value = "text", value_parser = parse_download_type)]
        data_type: DownloadDataType,
        /// Write the content to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Upload a local file or inline text, replacing an existing blob
    Upload {
        container: String,
        blob: String,
        #[command(flatten)]
        source: UploadSource,
        /// Shape of the payload: text or bytes
        #[arg(short = 't', long = "type", default_value = "bytes", value_parser = parse_upload_type)]
        data_type: UploadDataType,
    },
    /// Delete a blob if it exists
    #[command(alias = "rm")]
    Delete { container: String, blob: String },
    /// List top-level directories and blobs
    #[command(alias = "ls")]
    List { container: String },
    /// Create a container unless it exists
    CreateContainer { container: String },
    /// Delete a container if it exists
    DeleteContainer { container: String },
}

#[derive(Subcommand)]
pub enum FileCommands {
    /// Download a file
    Get {
        share: String,
        file: String,
        /// Directory below the share root
        #[arg(short, long, default_value = "")]
        directory: String,
        #[arg(short = 't', long = "type", default_value = "text", value_parser = parse_download_type)]
        data_type: DownloadDataType,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Upload a local file or inline text, replacing an existing file
    Upload {
        share: String,
        file: String,
        #[arg(short, long, default_value = "")]
        directory: String,
        #[command(flatten)]
        source: UploadSource,
        /// Shape of the payload: text or bytes
        #[arg(short = 't', long = "type", default_value = "bytes", value_parser = parse_upload_type)]
        data_type: UploadDataType,
    },
    /// Delete a file if it exists
    #[command(alias = "rm")]
    Delete {
        share: String,
        file: String,
        #[arg(short, long, default_value = "")]
        directory: String,
    },
    /// List a directory
    #[command(alias = "ls")]
    List {
        share: String,
        #[arg(default_value = "")]
        directory: String,
    },
}

#[derive(clap::Args)]
#[group(required = true, multiple = false)]
pub struct UploadSource {
    /// Local file to upload
    #[arg(short, long)]
    pub input: Option<PathBuf>,
    /// Inline text to upload
    #[arg(long)]
    pub text: Option<String>,
}

#[derive(Subcommand)]
pub enum QueueCommands {
    /// Add messages
    Add {
        queue: String,
        #[arg(required = true)]
        messages: Vec<String>,
        /// Message time-to-live in seconds
        #[arg(long)]
        ttl_secs: Option<u64>,
        /// Parse each message as JSON and store it re-serialized
        #[arg(long)]
        objects: bool,
    },
    /// Show the next message without removing it
    Peek {
        queue: String,
        /// Print only the message text
        #[arg(long)]
        text: bool,
    },
    /// Receive and delete a batch of messages
    Receive {
        queue: String,
        /// Print only the message texts
        #[arg(long, conflicts_with = "users")]
        text: bool,
        /// Decode each message as a user record
        #[arg(long)]
        users: bool,
    },
    /// Create a queue unless it exists
    Create { queue: String },
    /// Delete a queue if it exists
    Delete { queue: String },
}

#[derive(Subcommand)]
pub enum TableCommands {
    /// Create a table unless it exists
    Create { table: String },
    /// Delete a table if it exists
    Delete { table: String },
    /// List all tables
    #[command(alias = "ls")]
    List,
    /// Merchant entities
    Merchant {
        #[command(subcommand)]
        command: EntityCommands,
    },
    /// Reseller entities
    Reseller {
        #[command(subcommand)]
        command: EntityCommands,
    },
}

#[derive(Subcommand)]
pub enum EntityCommands {
    /// Insert or merge an entity
    Put {
        partition_key: String,
        row_key: String,
        /// Entity id; a random one when omitted
        #[arg(long)]
        id: Option<Uuid>,
        /// Merchant domain
        #[arg(long)]
        domain: Option<String>,
        /// Target table; defaults to the entity's own table
        #[arg(long)]
        table: Option<String>,
    },
    /// Fetch an entity
    Get {
        partition_key: String,
        row_key: String,
    },
    /// Delete an entity
    Delete {
        partition_key: String,
        row_key: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Write a default configuration file unless one exists
    Init,
    /// Show configuration file path
    Path,
}

impl Cli {
    pub async fn execute(self, mut config: Config) -> Result<()> {
        config.debug |= self.debug;
        config.output_json |= self.json;

        match self.command {
            Commands::Blob { command } => execute_blob_command(command, &config).await,
            Commands::File { command } => execute_file_command(command, &config).await,
            Commands::Queue { command } => execute_queue_command(command, &config).await,
            Commands::Table { command } => execute_table_command(command, &config).await,
            Commands::Config { command } => execute_config_command(command, &config).await,
        }
    }
}

fn storage_account(config: &Config) -> Result<StorageAccount> {
    config.storage_account()
}

fn http_client(config: &Config) -> Result<Client> {
    create_http_client(&NetworkConfig::from(&config.network))
}

async fn read_upload(source: UploadSource, data_type: UploadDataType) -> Result<Vec<u8>> {
    let payload = match (source.input, source.text) {
        (Some(path), _) => tokio::fs::read(&path).await?,
        (None, Some(text)) => text.into_bytes(),
        (None, None) => {
            return Err(AzstoreError::invalid_argument(
                "Either --input or --text is required",
            ))
        }
    };
    data_type.prepare(payload)
}

async fn write_download(data: DownloadedData, output: Option<PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            let length = data.len();
            tokio::fs::write(&path, data.into_bytes()).await?;
            println!("Wrote {length} bytes to {}", path.display());
        }
        None => match data {
            DownloadedData::Text(text) => println!("{text}"),
            DownloadedData::Bytes(bytes) => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(&bytes)?;
                stdout.flush()?;
            }
        },
    }
    Ok(())
}

fn print_flag(done: bool, done_message: String, skipped_message: String) {
    if done {
        println!("{done_message}");
    } else {
        println!("{skipped_message}");
    }
}

async fn execute_blob_command(command: BlobCommands, config: &Config) -> Result<()> {
    let storage = BlobStorage::from_account(&storage_account(config)?)?;

    match command {
        BlobCommands::Get {
            container,
            blob,
            data_type,
            output,
        } => {
            let data: DownloadedData = storage
                .get_blob_information(&container, &blob, data_type)
                .await?;
            write_download(data, output).await?;
        }
        BlobCommands::Upload {
            container,
            blob,
            source,
            data_type,
        } => {
            let payload = read_upload(source, data_type).await?;
            let length = payload.len();
            storage.upload_blob(payload, &container, &blob).await?;
            println!("Uploaded {length} bytes to {container}/{blob}");
        }
        BlobCommands::Delete { container, blob } => {
            storage.delete_blob(&container, &blob).await?;
            println!("Deleted {container}/{blob}");
        }
        BlobCommands::List { container } => {
            let items = storage.get_directory_list(&container).await?;
            print_items(&items, config.output_json, |item| ListingRow::from(item))?;
        }
        BlobCommands::CreateContainer { container } => {
            let created = storage.create_container(&container).await?;
            print_flag(
                created,
                format!("Created container {container}"),
                format!("Container {container} already exists"),
            );
        }
        BlobCommands::DeleteContainer { container } => {
            let deleted = storage.delete_container(&container).await?;
            print_flag(
                deleted,
                format!("Deleted container {container}"),
                format!("Container {container} does not exist"),
            );
        }
    }

    Ok(())
}

async fn execute_file_command(command: FileCommands, config: &Config) -> Result<()> {
    let storage = FileStorage::from_account(&storage_account(config)?, http_client(config)?)?;

    match command {
        FileCommands::Get {
            share,
            file,
            directory,
            data_type,
            output,
        } => {
            let data: DownloadedData = storage
                .get_file_information(&share, &directory, &file, data_type)
                .await?;
            write_download(data, output).await?;
        }
        FileCommands::Upload {
            share,
            file,
            directory,
            source,
            data_type,
        } => {
            let payload = read_upload(source, data_type).await?;
            let length = payload.len();
            storage.upload_file(payload, &share, &directory, &file).await?;
            println!("Uploaded {length} bytes to {share}/{file}");
        }
        FileCommands::Delete {
            share,
            file,
            directory,
        } => {
            storage.delete_file(&share, &directory, &file).await?;
            println!("Deleted {share}/{file}");
        }
        FileCommands::List { share, directory } => {
            let items = storage.get_directory_list(&share, &directory).await?;
            print_items(&items, config.output_json, |item| ListingRow::from(item))?;
        }
    }

    Ok(())
}

#[derive(Tabled)]
struct MessageRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Inserted")]
    inserted: String,
    #[tabled(rename = "Dequeues")]
    dequeue_count: u64,
    #[tabled(rename = "Text")]
    text: String,
}

impl From<&QueueMessage> for MessageRow {
    fn from(message: &QueueMessage) -> Self {
        Self {
            id: message.message_id.clone(),
            inserted: message.insertion_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            dequeue_count: message.dequeue_count,
            text: message.text.clone(),
        }
    }
}

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "User")]
    user_name: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Active")]
    is_active: bool,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            user_name: user.user_name.clone(),
            name: format!("{} {}", user.first_name, user.last_name),
            email: user.email.clone(),
            is_active: user.is_active,
        }
    }
}

async fn execute_queue_command(command: QueueCommands, config: &Config) -> Result<()> {
    let storage = QueueStorage::from_account(&storage_account(config)?, config.queue.clone())?;

    match command {
        QueueCommands::Add {
            queue,
            messages,
            ttl_secs,
            objects,
        } => {
            let ttl = ttl_secs.map(Duration::from_secs);
            let count = messages.len();
            if objects {
                let values = messages
                    .iter()
                    .map(|m| serde_json::from_str::<serde_json::Value>(m))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                storage.add_objects(&queue, &values, ttl).await?;
            } else {
                storage.add_messages(&queue, messages, ttl).await?;
            }
            println!("Added {count} messages to {queue}");
        }
        QueueCommands::Peek { queue, text } => {
            if text {
                match storage.peek_message_text(&queue).await? {
                    Some(text) => println!("{text}"),
                    None => println!("Queue {queue} is empty"),
                }
            } else {
                let message = storage.peek_message(&queue).await?;
                let messages: Vec<QueueMessage> = message.into_iter().collect();
                print_items(&messages, config.output_json, |m| MessageRow::from(m))?;
            }
        }
        QueueCommands::Receive { queue, text, users } => {
            if users {
                let users: Vec<User> = storage.receive_messages_as(&queue).await?;
                print_items(&users, config.output_json, |u| UserRow::from(u))?;
            } else if text {
                for text in storage.receive_messages_text(&queue).await? {
                    println!("{text}");
                }
            } else {
                let messages = storage.receive_messages(&queue).await?;
                print_items(&messages, config.output_json, |m| MessageRow::from(m))?;
            }
        }
        QueueCommands::Create { queue } => {
            let created = storage.create_queue(&queue).await?;
            print_flag(
                created,
                format!("Created queue {queue}"),
                format!("Queue {queue} already exists"),
            );
        }
        QueueCommands::Delete { queue } => {
            let deleted = storage.delete_queue(&queue).await?;
            print_flag(
                deleted,
                format!("Deleted queue {queue}"),
                format!("Queue {queue} does not exist"),
            );
        }
    }

    Ok(())
}

async fn execute_table_command(command: TableCommands, config: &Config) -> Result<()> {
    let storage = TableStorage::from_account(&storage_account(config)?)?;

    match command {
        TableCommands::Create { table } => {
            let created = storage.create_table(&table).await?;
            print_flag(
                created,
                format!("Created table {table}"),
                format!("Table {table} already exists"),
            );
        }
        TableCommands::Delete { table } => {
            let deleted = storage.delete_table(&table).await?;
            print_flag(
                deleted,
                format!("Deleted table {table}"),
                format!("Table {table} does not exist"),
            );
        }
        TableCommands::List => {
            let tables = storage.list_tables().await?;
            print_items(&tables, config.output_json, |name| NameRow { name: name.clone() })?;
        }
        TableCommands::Merchant { command } => {
            execute_entity_command(&storage, command, config, |pk, rk, id, domain| {
                let mut merchant = Merchant::new(pk, rk);
                merchant.merchant_id = id;
                merchant.domain = domain.unwrap_or_default();
                merchant
            })
            .await?;
        }
        TableCommands::Reseller { command } => {
            execute_entity_command(&storage, command, config, |pk, rk, id, _| {
                let mut reseller = Reseller::new(pk, rk);
                reseller.reseller_id = id;
                reseller
            })
            .await?;
        }
    }

    Ok(())
}

async fn execute_entity_command<E, F>(
    storage: &TableStorage,
    command: EntityCommands,
    config: &Config,
    build: F,
) -> Result<()>
where
    E: TableEntity + std::fmt::Debug,
    F: Fn(String, String, Uuid, Option<String>) -> E,
{
    match command {
        EntityCommands::Put {
            partition_key,
            row_key,
            id,
            domain,
            table,
        } => {
            let entity = build(
                partition_key,
                row_key,
                id.unwrap_or_else(Uuid::new_v4),
                domain,
            );
            let table = table.unwrap_or_else(|| E::TABLE_NAME.to_string());
            storage.insert_or_update(&table, &entity).await?;
            println!(
                "Stored ({}, {}) in {table}",
                entity.partition_key(),
                entity.row_key()
            );
        }
        EntityCommands::Get {
            partition_key,
            row_key,
        } => match storage.get_entity::<E>(&partition_key, &row_key).await? {
            Some(entity) if config.output_json => println!("{}", to_json(&entity)?),
            Some(entity) => println!("{entity:#?}"),
            None => println!(
                "No {} entity ({partition_key}, {row_key})",
                E::TABLE_NAME
            ),
        },
        EntityCommands::Delete {
            partition_key,
            row_key,
        } => {
            let entity = build(partition_key, row_key, Uuid::nil(), None);
            storage.delete_entity(&entity).await?;
            println!(
                "Deleted ({}, {}) from {}",
                entity.partition_key(),
                entity.row_key(),
                E::TABLE_NAME
            );
        }
    }

    Ok(())
}

#[derive(Tabled)]
struct ConfigItem {
    #[tabled(rename = "Setting")]
    key: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// Connection string with credential values masked
fn redact_connection_string(connection: &str) -> String {
    connection
        .split(';')
        .filter(|part| !part.trim().is_empty())
        .map(|part| match part.split_once('=') {
            Some((key, _))
                if key.eq_ignore_ascii_case("AccountKey")
                    || key.eq_ignore_ascii_case("SharedAccessSignature") =>
            {
                format!("{key}=****")
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

async fn execute_config_command(command: ConfigCommands, config: &Config) -> Result<()> {
    match command {
        ConfigCommands::Show => execute_config_show(config),
        ConfigCommands::Init => {
            let path = init_default_config().await?;
            println!("Configuration file: {}", path.display());
            Ok(())
        }
        ConfigCommands::Path => {
            println!("{}", Config::get_config_path()?.display());
            Ok(())
        }
    }
}

fn execute_config_show(config: &Config) -> Result<()> {
    let connection = if config.storage_account_connection.is_empty() {
        "<not set>".to_string()
    } else {
        redact_connection_string(&config.storage_account_connection)
    };

    if config.output_json {
        let mut shown = config.clone();
        shown.storage_account_connection = connection;
        println!("{}", to_json(&shown)?);
        return Ok(());
    }

    let items = vec![
        ConfigItem {
            key: "storage_account_connection",
            value: connection,
        },
        ConfigItem {
            key: "debug",
            value: config.debug.to_string(),
        },
        ConfigItem {
            key: "output_json",
            value: config.output_json.to_string(),
        },
        ConfigItem {
            key: "queue.message_ttl_days",
            value: config.queue.message_ttl_days.to_string(),
        },
        ConfigItem {
            key: "queue.batch_size",
            value: config.queue.batch_size.to_string(),
        },
        ConfigItem {
            key: "queue.visibility_timeout_secs",
            value: config.queue.visibility_timeout_secs.to_string(),
        },
        ConfigItem {
            key: "queue.base64_messages",
            value: config.queue.base64_messages.to_string(),
        },
        ConfigItem {
            key: "network.connect_timeout_secs",
            value: config.network.connect_timeout_secs.to_string(),
        },
        ConfigItem {
            key: "network.request_timeout_secs",
            value: config.network.request_timeout_secs.to_string(),
        },
    ];

    println!("{}", format_table(&items));
    Ok(())
}
