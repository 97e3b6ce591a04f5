use std::sync::Arc;

use anyhow::Context;
use davmount_core::Url;
use davmount_provider::{
    CacheConfig, CancellationToken, DavDocumentsProvider, DocumentColumn, LogNotifier, Mount,
    MountInput,
};
use serde_json::{Value, json};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Roots,
    Mounts,
    Query {
        document: i64,
        columns: Option<Vec<DocumentColumn>>,
    },
    Children {
        parent: i64,
        columns: Option<Vec<DocumentColumn>>,
    },
    IsChild {
        ancestor: i64,
        descendant: i64,
    },
    Copy {
        source: i64,
        target_parent: i64,
    },
    Rename {
        document: i64,
        display_name: String,
    },
    Delete(i64),
    Create {
        parent: i64,
        mime_type: String,
        display_name: String,
    },
    MountAdd {
        name: String,
        url: String,
        username: Option<String>,
        password: Option<String>,
    },
    MountRm(i64),
    SetQuota {
        root: i64,
        available: i64,
        used: i64,
    },
    Help,
}

fn parse_command<I>(args: I) -> anyhow::Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter().skip(1);
    let Some(command) = args.next() else {
        return Ok(Command::Help);
    };
    let rest: Vec<String> = args.collect();
    let parsed = match (command.as_str(), rest.as_slice()) {
        ("--help" | "-h" | "help", []) => Command::Help,
        ("roots", []) => Command::Roots,
        ("mounts", []) => Command::Mounts,
        ("query", [id]) => Command::Query {
            document: parse_number(id)?,
            columns: None,
        },
        ("query", [id, flag, list]) if flag == "--columns" => Command::Query {
            document: parse_number(id)?,
            columns: Some(parse_columns(list)?),
        },
        ("children", [id]) => Command::Children {
            parent: parse_number(id)?,
            columns: None,
        },
        ("children", [id, flag, list]) if flag == "--columns" => Command::Children {
            parent: parse_number(id)?,
            columns: Some(parse_columns(list)?),
        },
        ("is-child", [ancestor, descendant]) => Command::IsChild {
            ancestor: parse_number(ancestor)?,
            descendant: parse_number(descendant)?,
        },
        ("copy", [source, target_parent]) => Command::Copy {
            source: parse_number(source)?,
            target_parent: parse_number(target_parent)?,
        },
        ("rename", [document, display_name]) => Command::Rename {
            document: parse_number(document)?,
            display_name: display_name.clone(),
        },
        ("delete", [id]) => Command::Delete(parse_number(id)?),
        ("create", [parent, mime_type, display_name]) => Command::Create {
            parent: parse_number(parent)?,
            mime_type: mime_type.clone(),
            display_name: display_name.clone(),
        },
        ("mount-add", [name, url]) => Command::MountAdd {
            name: name.clone(),
            url: url.clone(),
            username: None,
            password: None,
        },
        ("mount-add", [name, url, username, password]) => Command::MountAdd {
            name: name.clone(),
            url: url.clone(),
            username: Some(username.clone()),
            password: Some(password.clone()),
        },
        ("mount-rm", [id]) => Command::MountRm(parse_number(id)?),
        ("set-quota", [root, available, used]) => Command::SetQuota {
            root: parse_number(root)?,
            available: parse_number(available)?,
            used: parse_number(used)?,
        },
        (other, _) => anyhow::bail!("unknown command or wrong arguments: {other}"),
    };
    Ok(parsed)
}

fn parse_number(value: &str) -> anyhow::Result<i64> {
    value
        .parse::<i64>()
        .with_context(|| format!("expected an integer, got {value:?}"))
}

fn parse_columns(list: &str) -> anyhow::Result<Vec<DocumentColumn>> {
    list.split(',')
        .map(|name| {
            DocumentColumn::parse(name.trim())
                .with_context(|| format!("unknown column {name:?}"))
        })
        .collect()
}

fn print_usage() {
    println!("Usage: davmount <command>");
    println!("  roots                             List one root per mount");
    println!("  mounts                            List configured mounts");
    println!("  query <id> [--columns <list>]     Show document metadata");
    println!("  children <id> [--columns <list>]  List cached children");
    println!("  is-child <ancestor> <descendant>  Test ancestry");
    println!("  copy <source> <parent>            Copy a document into a folder");
    println!("  rename <id> <name>                Rename a document");
    println!("  delete <id>                       Delete a document");
    println!("  create <parent> <mime> <name>     Create a file or directory");
    println!("  mount-add <name> <url> [<user> <password>]");
    println!("  mount-rm <id>                     Remove a mount and its cache");
    println!("  set-quota <root> <available> <used>");
}

fn mount_json(mount: &Mount) -> Value {
    json!({
        "id": mount.id,
        "name": mount.name,
        "url": mount.url.as_str(),
        "username": mount.username,
    })
}

fn run(
    provider: &DavDocumentsProvider,
    command: Command,
    cancel: &CancellationToken,
) -> anyhow::Result<Value> {
    let output = match command {
        Command::Help => Value::Null,
        Command::Roots => serde_json::to_value(provider.query_roots(None)?)?,
        Command::Mounts => Value::Array(provider.list_mounts()?.iter().map(mount_json).collect()),
        Command::Query { document, columns } => {
            serde_json::to_value(provider.query_document(document, columns.as_deref())?)?
        }
        Command::Children { parent, columns } => serde_json::to_value(
            provider.query_child_documents(parent, columns.as_deref())?,
        )?,
        Command::IsChild {
            ancestor,
            descendant,
        } => {
            let is_child = provider.is_child_document(ancestor, descendant)?;
            json!({ "is_child": is_child })
        }
        Command::Copy {
            source,
            target_parent,
        } => {
            let id = provider.copy_document(source, target_parent, cancel)?;
            json!({ "document_id": id })
        }
        Command::Rename {
            document,
            display_name,
        } => {
            let id = provider.rename_document(document, &display_name, cancel)?;
            json!({ "document_id": id })
        }
        Command::Delete(id) => {
            provider.delete_document(id, cancel)?;
            json!({ "deleted": id })
        }
        Command::Create {
            parent,
            mime_type,
            display_name,
        } => {
            let id = provider.create_document(parent, &mime_type, &display_name, cancel)?;
            json!({ "document_id": id })
        }
        Command::MountAdd {
            name,
            url,
            username,
            password,
        } => {
            let url = Url::parse(&url).with_context(|| format!("invalid mount url {url:?}"))?;
            mount_json(&provider.add_mount(&MountInput {
                name,
                url,
                username,
                password,
            })?)
        }
        Command::MountRm(id) => {
            provider.remove_mount(id)?;
            json!({ "removed": id })
        }
        Command::SetQuota {
            root,
            available,
            used,
        } => {
            provider.update_quota(root, Some(available), Some(used))?;
            json!({ "root": root, "available": available, "used": used })
        }
    };
    Ok(output)
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("DAVMOUNT_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let command = parse_command(std::env::args())?;
    if command == Command::Help {
        print_usage();
        return Ok(());
    }

    let config = CacheConfig::from_env()?;
    let provider = DavDocumentsProvider::open(config, Arc::new(LogNotifier))?;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    provider.runtime().spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling");
            trigger.cancel();
        }
    });

    let output = run(&provider, command, &cancel)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
