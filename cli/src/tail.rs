use hearthwatch_core::{LogWatcher, ParsingSession};

/// Feed every chunk the watcher yields into the session until the watcher
/// shuts down or Ctrl-C is pressed.
pub async fn follow(mut watcher: LogWatcher, mut session: ParsingSession) {
    println!("Watching {}", watcher.path().display());

    loop {
        tokio::select! {
            chunk = watcher.next_chunk() => match chunk {
                Some(Ok(chunk)) => {
                    // Buffered input belonged to the file before it was truncated.
                    if chunk.truncated {
                        session.reset_parser();
                    }
                    session.process_bytes(&chunk.bytes);
                }
                Some(Err(err)) => tracing::warn!(error = %err, "failed to read log"),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.finish();
}
