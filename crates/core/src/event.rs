//! 이벤트 모델 — 파이프라인을 흐르는 단일 레코드
//!
//! [`Event`]는 입력 단계에서 파싱된 JSON 필드 집합과 추적 메타데이터를 담습니다.
//! [`EventFields`] trait은 조건 엔진이 이벤트 필드를 조회하는 유일한 인터페이스이며,
//! 점(`.`)으로 구분된 필드 경로를 중첩 맵/배열을 따라 탐색합니다.

use std::borrow::Cow;
use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 표준 입력에서 읽은 이벤트의 소스명
pub const EVENT_SOURCE_STDIN: &str = "stdin";

/// 이벤트 메타데이터 — 이벤트가 어디서 왔는지 추적합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// 수집 시각
    pub timestamp: SystemTime,
    /// 입력 소스 (파일 경로, stdin 등)
    pub source: String,
    /// 소스 내 오프셋 (라인 번호 또는 바이트 오프셋)
    pub offset: u64,
}

impl EventMetadata {
    /// 현재 시각으로 메타데이터를 생성합니다.
    pub fn new(source: impl Into<String>, offset: u64) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source: source.into(),
            offset,
        }
    }
}

/// 파이프라인 이벤트
///
/// 필드는 `serde_json::Value`로 보관되며, 액션 단계에서 수정될 수 있습니다.
/// `route`는 route 액션이 지정한 출력 이름입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// 이벤트 고유 ID (UUID v4)
    pub id: String,
    /// 메타데이터
    pub metadata: EventMetadata,
    /// 이벤트 필드
    pub fields: Value,
    /// 라우팅 대상 출력 이름
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
}

impl Event {
    /// 필드 값으로 새 이벤트를 생성합니다.
    pub fn new(fields: Value, source: impl Into<String>, offset: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::new(source, offset),
            fields,
            route: None,
        }
    }

    /// 원시 JSON 바이트에서 이벤트를 파싱합니다.
    pub fn from_json(
        raw: &[u8],
        source: impl Into<String>,
        offset: u64,
    ) -> Result<Self, serde_json::Error> {
        let fields: Value = serde_json::from_slice(raw)?;
        Ok(Self::new(fields, source, offset))
    }

    /// 경로에 해당하는 필드 값을 반환합니다.
    pub fn get(&self, path: &[String]) -> Option<&Value> {
        lookup(&self.fields, path)
    }

    /// 경로에 값을 기록합니다. 중간 객체가 없으면 생성합니다.
    ///
    /// 경로 중간에 객체가 아닌 값이 있으면 덮어쓰지 않고 `false`를 반환합니다.
    pub fn set(&mut self, path: &[String], value: Value) -> bool {
        let Some((last, parents)) = path.split_last() else {
            return false;
        };

        let mut current = &mut self.fields;
        for segment in parents {
            current = match current {
                Value::Object(map) => map
                    .entry(segment.clone())
                    .or_insert_with(|| Value::Object(Map::new())),
                _ => return false,
            };
        }

        match current {
            Value::Object(map) => {
                map.insert(last.clone(), value);
                true
            }
            _ => false,
        }
    }

    /// 경로의 필드를 제거하고 이전 값을 반환합니다.
    pub fn remove(&mut self, path: &[String]) -> Option<Value> {
        let (last, parents) = path.split_last()?;

        let mut current = &mut self.fields;
        for segment in parents {
            current = match current {
                Value::Object(map) => map.get_mut(segment)?,
                _ => return None,
            };
        }

        match current {
            Value::Object(map) => map.remove(last),
            _ => None,
        }
    }

    /// 출력 라우트를 지정합니다.
    pub fn set_route(&mut self, output: impl Into<String>) {
        self.route = Some(output.into());
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}:{}] {}",
            self.metadata.source, self.metadata.offset, self.fields
        )
    }
}

/// 이벤트 필드 조회 인터페이스
///
/// 조건 엔진은 이 trait만으로 이벤트에 접근합니다.
/// `None`은 필드가 없거나 JSON `null`임을 뜻합니다.
pub trait EventFields {
    /// 경로의 필드를 바이트 시퀀스로 반환합니다.
    fn field_bytes(&self, path: &[String]) -> Option<Cow<'_, [u8]>>;
}

impl EventFields for Value {
    /// 문자열은 원본 바이트, 그 밖의 값은 compact JSON 인코딩을 반환합니다.
    fn field_bytes(&self, path: &[String]) -> Option<Cow<'_, [u8]>> {
        match lookup(self, path)? {
            Value::Null => None,
            Value::String(s) => Some(Cow::Borrowed(s.as_bytes())),
            other => Some(Cow::Owned(other.to_string().into_bytes())),
        }
    }
}

impl EventFields for Event {
    fn field_bytes(&self, path: &[String]) -> Option<Cow<'_, [u8]>> {
        self.fields.field_bytes(path)
    }
}

/// 중첩 객체/배열을 따라 경로를 탐색합니다.
///
/// 배열은 숫자 세그먼트로 인덱싱합니다. 스칼라를 만나면 `None`입니다.
pub fn lookup<'a>(root: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = root;
    for segment in path {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// 점으로 구분된 필드명을 경로 세그먼트로 분리합니다.
///
/// `\.`는 세그먼트 내부의 리터럴 점으로 취급합니다 (`k8s\.pod.name` → `["k8s.pod", "name"]`).
pub fn split_field_path(name: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = name.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'.') => {
                current.push('.');
                chars.next();
            }
            '.' => segments.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    segments.push(current);

    segments
}
