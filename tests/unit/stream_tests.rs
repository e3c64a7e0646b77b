/*!
 * Tests for stream decoding through a provider normalizer
 */

use bytes::Bytes;
use promptlens::providers::{ProviderId, provider_for};
use promptlens::stream::decode_stream;
use promptlens::task::{EventEmitter, NormalizedEvent, TaskKind};
use tokio::sync::mpsc;

use crate::common::{chunk, error};

/// Decode a body delivered as the given pieces
async fn decode_pieces(provider: ProviderId, pieces: Vec<Vec<u8>>) -> Vec<NormalizedEvent> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let adapter = provider_for(provider);
    {
        let mut emitter = EventEmitter::new(tx, TaskKind::Translate);
        emitter.begin_request();
        emitter.begin_streaming();
        let body = futures::stream::iter(pieces.into_iter().map(|piece| Ok::<_, std::io::Error>(Bytes::from(piece))));
        decode_stream(body, adapter.as_ref(), &mut emitter).await.unwrap();
    }

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn openai_body() -> Vec<u8> {
    concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"Xin \"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"chào\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\" thế giới\"}}]}\n\n",
        "data: [DONE]\n\n",
    )
    .as_bytes()
    .to_vec()
}

#[tokio::test]
async fn test_decodeStream_everySplitPoint_shouldMatchWholeBody() {
    let body = openai_body();
    let whole = decode_pieces(ProviderId::OpenAI, vec![body.clone()]).await;
    assert_eq!(whole, vec![chunk("Xin "), chunk("chào"), chunk(" thế giới"), NormalizedEvent::Done]);

    for split in 1..body.len() {
        let pieces = vec![body[..split].to_vec(), body[split..].to_vec()];
        assert_eq!(decode_pieces(ProviderId::OpenAI, pieces).await, whole, "split at {}", split);
    }
}

#[tokio::test]
async fn test_decodeStream_byteAtATime_shouldMatchWholeBody() {
    let body = openai_body();
    let pieces: Vec<Vec<u8>> = body.iter().map(|b| vec![*b]).collect();
    let events = decode_pieces(ProviderId::OpenAI, pieces).await;
    assert_eq!(events.len(), 4);
    assert_eq!(events.last(), Some(&NormalizedEvent::Done));
}

#[tokio::test]
async fn test_decodeStream_sentinel_shouldIgnoreTrailingFrames() {
    let body = b"data: {\"delta\":{\"text\":\"a\"}}\ndata: [DONE]\ndata: {\"delta\":{\"text\":\"b\"}}\n".to_vec();
    let events = decode_pieces(ProviderId::Anthropic, vec![body]).await;
    assert_eq!(events, vec![chunk("a"), NormalizedEvent::Done]);
}

#[tokio::test]
async fn test_decodeStream_noSentinel_shouldEndWithDoneAtEof() {
    let body = b"data: {\"delta\":{\"text\":\"only\"}}".to_vec();
    let events = decode_pieces(ProviderId::Anthropic, vec![body]).await;
    assert_eq!(events, vec![chunk("only"), NormalizedEvent::Done]);
}

#[tokio::test]
async fn test_decodeStream_ndjsonDoneFlag_shouldTerminate() {
    let body = b"{\"response\":\"Bon\",\"done\":false}\n{\"response\":\"jour\",\"done\":true}\n{\"response\":\"late\"}\n".to_vec();
    let events = decode_pieces(ProviderId::Local, vec![body]).await;
    assert_eq!(events, vec![chunk("Bon"), chunk("jour"), NormalizedEvent::Done]);
}

#[tokio::test]
async fn test_decodeStream_readFailure_shouldReturnErrorWithoutTerminal() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let adapter = provider_for(ProviderId::OpenAI);
    let mut emitter = EventEmitter::new(tx, TaskKind::Summarize);
    emitter.begin_request();
    emitter.begin_streaming();

    let body = futures::stream::iter(vec![
        Ok(Bytes::from_static(b"data: {\"choices\":[{\"delta\":{\"content\":\"part\"}}]}\n")),
        Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
    ]);
    assert!(decode_stream(body, adapter.as_ref(), &mut emitter).await.is_err());

    assert_eq!(rx.try_recv().ok(), Some(chunk("part")));
    assert!(rx.try_recv().is_err());

    // The emitter closes the sequence when dropped unfinished
    drop(emitter);
    assert_eq!(rx.try_recv().ok(), Some(error("Summarization failed")));
}
