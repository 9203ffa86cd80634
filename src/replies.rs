use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Short canned answers used when the AI responder is disabled.
pub const FALLBACK_PHRASES: &[&str] = &[
    "✅ Да",
    "❌ Нет",
    "🤔 Возможно",
    "🎯 Конечно!",
    "🙅‍♂️ Вряд ли",
    "🔮 Спроси позже",
    "⚡ Определенно да!",
    "🚫 Точно нет!",
];

/// Sent in place of an AI answer when the completion call fails.
pub const AI_APOLOGY: &str = "Извини, возникла ошибка. Попробуй еще раз!";

/// Name used when the platform does not tell us who sent the message.
pub const ANONYMOUS_USER: &str = "Аноним";

pub const HELP_TEXT: &str = "📋 Доступные команды:\n\n\
    /start - Начать работу с ботом\n\
    /help - Получить справку\n\
    /info - Информация о боте\n\n\
    Просто напиши любое сообщение, и я отвечу!";

pub const INFO_TEXT: &str = "ℹ️ Информация о боте:\n\n\
    🤖 Тип: Бот ответов\n\
    ⏰ Режим: 24/7\n\
    💬 Ответы: YandexGPT или случайная фраза\n\
    💻 Технологии: Rust, teloxide";

pub fn greeting(user_name: &str) -> String {
    format!(
        "👋 Привет, {}!\n\n\
         Я телеграм-бот, который отвечает на вопросы.\n\
         Просто напиши мне что-нибудь, и я отвечу:\n",
        user_name
    )
}

/// Commands the bot answers with canned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Info,
}

impl Command {
    /// Case-insensitive exact match; anything else is free text.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("/start") {
            Some(Command::Start)
        } else if text.eq_ignore_ascii_case("/help") {
            Some(Command::Help)
        } else if text.eq_ignore_ascii_case("/info") {
            Some(Command::Info)
        } else {
            None
        }
    }

    /// Messages to send, in order.
    pub fn replies(self, user_name: &str) -> Vec<String> {
        match self {
            Command::Start => vec![greeting(user_name), HELP_TEXT.to_string()],
            Command::Help => vec![HELP_TEXT.to_string()],
            Command::Info => vec![INFO_TEXT.to_string()],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Command::Start => "greeting",
            Command::Help => "help",
            Command::Info => "info",
        }
    }
}

/// Pick one phrase uniformly at random. `phrases` must not be empty.
pub fn pick_random_from<'a, R: Rng + ?Sized>(rng: &mut R, phrases: &[&'a str]) -> &'a str {
    phrases.choose(rng).copied().unwrap_or_default()
}

/// Picks fallback phrases. Owns its random source so tests can seed it.
pub struct ResponseSelector<R = StdRng> {
    rng: R,
    phrases: &'static [&'static str],
}

impl ResponseSelector<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> ResponseSelector<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            phrases: FALLBACK_PHRASES,
        }
    }

    pub fn pick_random(&mut self) -> &'static str {
        pick_random_from(&mut self.rng, self.phrases)
    }
}
